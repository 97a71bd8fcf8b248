//! Profiler call-outs around execution
//!
//! Every method is a no-op by default; hooks observe scheduling but never
//! affect it.

pub trait RenderGraphProfiler {
    fn on_acquire_executor(&mut self, _frame_index: u64, _frame_slot: u32) {}
    fn on_cmd_begin(&mut self, _frame_index: u64) {}
    fn on_cmd_end(&mut self, _frame_index: u64) {}
    fn on_pass_begin(&mut self, _pass: &str) {}
    fn on_pass_end(&mut self, _pass: &str) {}
    fn before_commit(&mut self, _frame_index: u64) {}
    fn after_commit(&mut self, _frame_index: u64) {}
}
