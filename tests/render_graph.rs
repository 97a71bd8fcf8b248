//! End-to-end graph behavior against a recording backend

mod common;

use common::{Call, RecordingBackend};
use render_graph::backend::*;
use render_graph::render_graph::{
    RenderGraph, RenderGraphError, RenderGraphProfiler, TextureViewPool,
};
use std::cell::Cell;
use std::rc::Rc;

fn backbuffer_desc(width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor {
        label: Some("backbuffer".to_string()),
        width,
        height,
        format: TextureFormat::Bgra8Unorm,
        usage: TextureUsage::RENDER_TARGET,
        ..Default::default()
    }
}

#[test]
fn unreferenced_work_is_culled() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let color = graph.create_texture(|t| {
        t.set_name("color")
            .extent(256, 256, 1)
            .allow_render_target()
            .exported();
    });
    let main = graph.add_render_pass(
        |p| {
            p.set_name("main")
                .write(0, color, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );

    // Nothing consumes this pass's output and the texture is not exported.
    let scratch = graph.create_texture(|t| {
        t.set_name("scratch").extent(64, 64, 1).allow_readwrite();
    });
    let culled_ran = Rc::new(Cell::new(false));
    let culled_flag = culled_ran.clone();
    let noop = graph.add_compute_pass(
        |p| {
            p.set_name("noop").readwrite(0, 0, scratch);
        },
        move |_| culled_flag.set(true),
    );

    graph.compile().unwrap();

    assert!(!graph.is_pass_culled(main));
    assert!(!graph.is_texture_culled(color));
    assert!(graph.is_pass_culled(noop));
    assert!(graph.is_texture_culled(scratch));
    assert_eq!(graph.culled_pass_count(), 1);
    assert_eq!(graph.culled_resource_count(), 1);

    graph.execute(&mut backend, None).unwrap();

    // Culled work never runs and its output is never allocated.
    assert!(!culled_ran.get());
    assert_eq!(backend.count(|c| matches!(c, Call::BeginComputePass(_))), 0);
    assert_eq!(backend.count(|c| matches!(c, Call::CreateTexture(_))), 1);
}

#[test]
fn present_keeps_producer_chain_live() {
    let mut graph = RenderGraph::new(|b| {
        b.frontend_only();
    });

    let scene = graph.create_texture(|t| {
        t.set_name("scene").extent(256, 256, 1).allow_render_target();
    });
    let backbuffer = graph.create_texture(|t| {
        t.set_name("backbuffer")
            .import(TextureId(1), backbuffer_desc(256, 256), ResourceState::Undefined);
    });

    let draw = graph.add_render_pass(
        |p| {
            p.set_name("draw")
                .write(0, scene, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );
    let blit = graph.add_render_pass(
        |p| {
            p.set_name("blit")
                .read(0, 0, scene)
                .write(0, backbuffer, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
    graph.add_present_pass(|p| {
        p.set_name("present")
            .swapchain(SwapchainId(1), 0)
            .texture(backbuffer);
    });

    graph.compile().unwrap();

    assert!(!graph.is_pass_culled(draw));
    assert!(!graph.is_pass_culled(blit));
    assert!(!graph.is_texture_culled(scene));
    assert_eq!(graph.culled_pass_count(), 0);
    assert_eq!(graph.culled_resource_count(), 0);
}

#[test]
fn cyclic_dependency_is_rejected() {
    let mut graph = RenderGraph::new(|b| {
        b.frontend_only();
    });

    let a = graph.create_texture(|t| {
        t.set_name("a").extent(64, 64, 1).allow_render_target().exported();
    });
    let b = graph.create_texture(|t| {
        t.set_name("b").extent(64, 64, 1).allow_render_target().exported();
    });

    graph.add_render_pass(
        |p| {
            p.set_name("p1")
                .read(0, 0, b)
                .write(0, a, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
    graph.add_render_pass(
        |p| {
            p.set_name("p2")
                .read(0, 0, a)
                .write(0, b, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    match graph.compile() {
        Err(RenderGraphError::CyclicDependency { passes }) => {
            assert!(passes.contains(&"p1".to_string()));
            assert!(passes.contains(&"p2".to_string()));
        }
        other => panic!("expected cyclic dependency error, got {other:?}"),
    }
}

#[test]
fn render_then_present_runs_in_order() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let backbuffer = graph.create_texture(|t| {
        t.set_name("backbuffer")
            .import(TextureId(777), backbuffer_desc(800, 600), ResourceState::Undefined);
    });
    graph.add_render_pass(
        |p| {
            p.set_name("main").write(
                0,
                backbuffer,
                LoadAction::Clear([0.0, 0.0, 0.0, 1.0]),
                StoreAction::Store,
            );
        },
        |_| {},
    );
    let present = graph.add_present_pass(|p| {
        p.set_name("present")
            .swapchain(SwapchainId(3), 2)
            .texture(backbuffer);
    });

    graph.compile().unwrap();

    // Before the present pass runs, the backbuffer still holds the state the
    // producer left it in.
    assert!(matches!(
        graph.latest_texture_state(backbuffer, present),
        Ok(ResourceState::RenderTarget)
    ));

    let frame = graph.execute(&mut backend, None).unwrap();
    assert_eq!(frame, 1);
    assert_eq!(graph.pass_count(), 0);

    // The imported backbuffer is never allocated by the graph.
    assert_eq!(backend.count(|c| matches!(c, Call::CreateTexture(_))), 0);

    let render_pos = backend
        .position(|c| matches!(c, Call::BeginRenderPass { label: Some(l), color_count: 1, .. } if l == "main"))
        .expect("render pass recorded");
    let submit_pos = backend.position(|c| matches!(c, Call::Submit)).unwrap();
    let present_pos = backend
        .position(|c| matches!(c, Call::Present(SwapchainId(3), 2)))
        .expect("present recorded");
    assert!(render_pos < submit_pos);
    assert!(submit_pos < present_pos);

    assert_eq!(
        backend.texture_barriers_for(TextureId(777)),
        vec![
            TextureBarrier {
                texture: TextureId(777),
                src_state: ResourceState::Undefined,
                dst_state: ResourceState::RenderTarget,
            },
            TextureBarrier {
                texture: TextureId(777),
                src_state: ResourceState::RenderTarget,
                dst_state: ResourceState::Present,
            },
        ]
    );
}

#[test]
fn consecutive_same_state_reads_merge_into_one_transition() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let scene = graph.create_texture(|t| {
        t.set_name("scene").import(
            TextureId(50),
            TextureDescriptor {
                width: 128,
                height: 128,
                usage: TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
                ..Default::default()
            },
            ResourceState::Undefined,
        );
    });
    let out_a = graph.create_texture(|t| {
        t.set_name("out_a").extent(128, 128, 1).allow_render_target().exported();
    });
    let out_b = graph.create_texture(|t| {
        t.set_name("out_b").extent(128, 128, 1).allow_render_target().exported();
    });

    graph.add_render_pass(
        |p| {
            p.set_name("draw")
                .write(0, scene, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );
    graph.add_render_pass(
        |p| {
            p.set_name("blur_a")
                .read(0, 0, scene)
                .write(0, out_a, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
    let blur_b = graph.add_render_pass(
        |p| {
            p.set_name("blur_b")
                .read(0, 0, scene)
                .write(0, out_b, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    graph.compile().unwrap();

    // The second reader's requirement merged into the first transition.
    assert!(matches!(
        graph.latest_texture_state(scene, blur_b),
        Ok(ResourceState::ShaderResource)
    ));

    graph.execute(&mut backend, None).unwrap();

    assert_eq!(
        backend.texture_barriers_for(TextureId(50)),
        vec![
            TextureBarrier {
                texture: TextureId(50),
                src_state: ResourceState::Undefined,
                dst_state: ResourceState::RenderTarget,
            },
            TextureBarrier {
                texture: TextureId(50),
                src_state: ResourceState::RenderTarget,
                dst_state: ResourceState::ShaderResource,
            },
        ]
    );
}

#[test]
fn compute_pass_dispatches_with_resolved_bindings() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let target = graph.create_texture(|t| {
        t.set_name("sim_target")
            .import(
                TextureId(9),
                TextureDescriptor {
                    width: 64,
                    height: 64,
                    usage: TextureUsage::STORAGE,
                    ..Default::default()
                },
                ResourceState::Undefined,
            )
            .exported();
    });

    let ran = Rc::new(Cell::new(false));
    let saw_binding = Rc::new(Cell::new(false));
    let ran_in_pass = ran.clone();
    let saw_in_pass = saw_binding.clone();
    graph.add_compute_pass(
        |p| {
            p.set_name("sim")
                .readwrite(0, 1, target)
                .set_pipeline(ComputePipelineId(5));
        },
        move |ctx| {
            ran_in_pass.set(true);
            saw_in_pass.set(ctx.texture_view(0, 1).is_some());
        },
    );

    graph.compile().unwrap();
    graph.execute(&mut backend, None).unwrap();

    assert!(ran.get());
    assert!(saw_binding.get());
    assert!(backend
        .position(|c| matches!(c, Call::SetComputePipeline(ComputePipelineId(5))))
        .is_some());
    assert!(backend
        .position(|c| matches!(c, Call::BeginComputePass(Some(l)) if l == "sim"))
        .is_some());
    assert_eq!(
        backend.texture_barriers_for(TextureId(9)),
        vec![TextureBarrier {
            texture: TextureId(9),
            src_state: ResourceState::Undefined,
            dst_state: ResourceState::UnorderedAccess,
        }]
    );
}

#[test]
fn copy_pass_records_the_copy() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let upload = graph.create_buffer(|b| {
        b.set_name("upload").import(
            BufferId(10),
            BufferDescriptor {
                size: 256,
                usage: BufferUsage::COPY_SRC,
                ..Default::default()
            },
            ResourceState::CopySource,
        );
    });
    let vertices = graph.create_buffer(|b| {
        b.set_name("vertices")
            .import(
                BufferId(11),
                BufferDescriptor {
                    size: 256,
                    usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                    ..Default::default()
                },
                ResourceState::CopyDest,
            )
            .exported();
    });

    graph.add_copy_pass(|p| {
        p.set_name("upload_vertices").buffer_to_buffer(upload, vertices);
    });

    graph.compile().unwrap();
    graph.execute(&mut backend, None).unwrap();

    assert!(backend
        .position(|c| matches!(
            c,
            Call::CopyBuffer(BufferCopy {
                src: BufferId(10),
                dst: BufferId(11),
                size: 256,
                ..
            })
        ))
        .is_some());
    // Both buffers were imported already in their copy states.
    assert!(backend.barriers().is_empty());
}

#[test]
fn transients_are_reclaimed_when_their_slot_comes_around() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let mut populate = |graph: &mut RenderGraph| {
        let tex = graph.create_texture(|t| {
            t.set_name("transient")
                .extent(32, 32, 1)
                .allow_render_target()
                .exported();
        });
        graph.add_render_pass(
            |p| {
                p.set_name("fill")
                    .write(0, tex, LoadAction::Clear([0.0; 4]), StoreAction::Store);
            },
            |_| {},
        );
    };

    for _ in 0..3 {
        populate(&mut graph);
        graph.compile().unwrap();
        graph.execute(&mut backend, None).unwrap();
    }
    assert_eq!(backend.count(|c| matches!(c, Call::DestroyTexture(_))), 0);

    // The fourth frame reuses slot 0 and frees the first frame's transient.
    populate(&mut graph);
    graph.compile().unwrap();
    graph.execute(&mut backend, None).unwrap();

    let first_created = backend
        .calls
        .iter()
        .find_map(|c| match c {
            Call::CreateTexture(id) => Some(*id),
            _ => None,
        })
        .unwrap();
    let destroyed: Vec<_> = backend
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::DestroyTexture(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(destroyed, vec![first_created]);
}

#[test]
fn reclaimed_transients_drop_their_cached_views() {
    let mut backend = RecordingBackend::with_texture_id_recycling();
    let mut graph = RenderGraph::new(|_| {});

    let mut populate = |graph: &mut RenderGraph| {
        let tex = graph.create_texture(|t| {
            t.set_name("transient")
                .extent(32, 32, 1)
                .allow_render_target()
                .exported();
        });
        graph.add_render_pass(
            |p| {
                p.set_name("fill")
                    .write(0, tex, LoadAction::Clear([0.0; 4]), StoreAction::Store);
            },
            |_| {},
        );
    };

    // Four frames; the fourth reclaims slot 0, frees the first transient and
    // gets its texture id back from the recycling backend.
    for _ in 0..4 {
        populate(&mut graph);
        graph.compile().unwrap();
        graph.execute(&mut backend, None).unwrap();
    }

    let created: Vec<_> = backend
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::CreateTexture(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 4);
    assert_eq!(created[0], created[3]);

    // The freed texture's attachment view was erased with it, so the
    // recycled id resolves to a fresh view instead of the stale cache entry.
    assert_eq!(backend.count(|c| matches!(c, Call::DestroyTexture(_))), 1);
    assert_eq!(backend.count(|c| matches!(c, Call::DestroyTextureView(_))), 1);
    assert_eq!(backend.count(|c| matches!(c, Call::CreateTextureView(_))), 4);
}

#[test]
fn buffer_edges_order_passes_and_emit_barriers() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let particles = graph.create_buffer(|b| {
        b.set_name("particles").import(
            BufferId(40),
            BufferDescriptor {
                size: 4096,
                usage: BufferUsage::STORAGE | BufferUsage::VERTEX,
                ..Default::default()
            },
            ResourceState::Undefined,
        );
    });
    let backbuffer = graph.create_texture(|t| {
        t.set_name("backbuffer")
            .import(TextureId(2), backbuffer_desc(128, 128), ResourceState::Undefined);
    });

    let sim_bound = Rc::new(Cell::new(false));
    let sim_flag = sim_bound.clone();
    graph.add_compute_pass(
        |p| {
            p.set_name("simulate").readwrite_buffer(0, 0, particles);
        },
        move |ctx| sim_flag.set(ctx.buffer(0, 0).is_some()),
    );

    let vertex_bound = Rc::new(Cell::new(false));
    let vertex_flag = vertex_bound.clone();
    graph.add_render_pass(
        |p| {
            p.set_name("draw")
                .use_buffer(particles, ResourceState::VertexBuffer)
                .write(0, backbuffer, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        move |ctx| {
            vertex_flag.set(
                ctx.pipeline_buffers()
                    == [(BufferId(40), ResourceState::VertexBuffer)].as_slice(),
            );
        },
    );
    graph.add_present_pass(|p| {
        p.set_name("present")
            .swapchain(SwapchainId(1), 0)
            .texture(backbuffer);
    });

    graph.compile().unwrap();
    assert_eq!(graph.culled_pass_count(), 0);
    assert_eq!(graph.culled_resource_count(), 0);

    graph.execute(&mut backend, None).unwrap();

    // The producer's storage binding and the consumer's vertex binding both
    // resolved to the imported buffer.
    assert!(sim_bound.get());
    assert!(vertex_bound.get());

    let compute_pos = backend
        .position(|c| matches!(c, Call::BeginComputePass(Some(l)) if l == "simulate"))
        .expect("compute pass recorded");
    let render_pos = backend
        .position(|c| matches!(c, Call::BeginRenderPass { .. }))
        .expect("render pass recorded");
    assert!(compute_pos < render_pos);

    let buffer_barriers: Vec<BufferBarrier> = backend
        .barriers()
        .into_iter()
        .filter_map(|barrier| match barrier {
            ResourceBarrier::Buffer(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(
        buffer_barriers,
        vec![
            BufferBarrier {
                buffer: BufferId(40),
                src_state: ResourceState::Undefined,
                dst_state: ResourceState::UnorderedAccess,
            },
            BufferBarrier {
                buffer: BufferId(40),
                src_state: ResourceState::UnorderedAccess,
                dst_state: ResourceState::VertexBuffer,
            },
        ]
    );
}

#[test]
#[should_panic(expected = "mrt index")]
fn out_of_range_mrt_index_panics() {
    let mut graph = RenderGraph::new(|b| {
        b.frontend_only();
    });
    let color = graph.create_texture(|t| {
        t.set_name("color").extent(8, 8, 1).allow_render_target();
    });
    graph.add_render_pass(
        |p| {
            p.write(8, color, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
}

#[test]
fn disjoint_transients_share_backing_when_aliasing_is_enabled() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|b| {
        b.enable_memory_aliasing();
    });

    let first = graph.create_texture(|t| {
        t.set_name("ping").extent(64, 64, 1).allow_render_target();
    });
    let out_a = graph.create_texture(|t| {
        t.set_name("out_a")
            .import(TextureId(20), backbuffer_desc(64, 64), ResourceState::Undefined)
            .exported();
    });
    let second = graph.create_texture(|t| {
        t.set_name("pong").extent(64, 64, 1).allow_render_target();
    });
    let out_b = graph.create_texture(|t| {
        t.set_name("out_b")
            .import(TextureId(21), backbuffer_desc(64, 64), ResourceState::Undefined)
            .exported();
    });

    // `ping` is dead after the second pass; `pong` starts in the third.
    graph.add_render_pass(
        |p| {
            p.set_name("p1")
                .write(0, first, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );
    graph.add_render_pass(
        |p| {
            p.set_name("p2")
                .read(0, 0, first)
                .write(0, out_a, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
    graph.add_render_pass(
        |p| {
            p.set_name("p3")
                .write(0, second, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );
    graph.add_render_pass(
        |p| {
            p.set_name("p4")
                .read(0, 0, second)
                .write(0, out_b, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    graph.compile().unwrap();
    graph.execute(&mut backend, None).unwrap();

    assert_eq!(backend.count(|c| matches!(c, Call::CreateTexture(_))), 1);
}

#[test]
fn texture_views_are_cached_and_age_out() {
    let mut backend = RecordingBackend::new();
    let pool = TextureViewPool::new(DeviceId(0));

    let desc = |base_mip_level: u32| TextureViewDescriptor {
        texture: TextureId(7),
        format: TextureFormat::Rgba8Unorm,
        usage: TextureViewUsage::SRV,
        aspect: TextureAspect::COLOR,
        dims: TextureDimension::D2,
        base_mip_level,
        mip_level_count: 1,
        base_array_layer: 0,
        array_layer_count: 1,
    };

    let first = pool.allocate(&mut backend, &desc(0), 1).unwrap();
    let again = pool.allocate(&mut backend, &desc(0), 2).unwrap();
    assert_eq!(first, again);
    assert_eq!(backend.count(|c| matches!(c, Call::CreateTextureView(_))), 1);

    pool.allocate(&mut backend, &desc(1), 1).unwrap();
    assert_eq!(pool.len(), 2);

    // Only the view untouched since frame 1 ages out; the hit above refreshed
    // the first view's stamp to frame 2.
    assert_eq!(pool.collect_garbage(&mut backend, 2), 1);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.collect_garbage(&mut backend, 3), 1);
    assert!(pool.is_empty());
}

#[test]
fn erase_releases_every_view_of_a_texture() {
    let mut backend = RecordingBackend::new();
    let pool = TextureViewPool::new(DeviceId(0));

    let desc = |texture: TextureId, base_mip_level: u32| TextureViewDescriptor {
        texture,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureViewUsage::SRV,
        aspect: TextureAspect::COLOR,
        dims: TextureDimension::D2,
        base_mip_level,
        mip_level_count: 1,
        base_array_layer: 0,
        array_layer_count: 1,
    };

    for mip in 0..3 {
        pool.allocate(&mut backend, &desc(TextureId(7), mip), 1).unwrap();
    }
    pool.allocate(&mut backend, &desc(TextureId(8), 0), 1).unwrap();

    assert_eq!(pool.erase(&mut backend, TextureId(7)), 3);
    assert_eq!(pool.len(), 1);
    assert_eq!(backend.count(|c| matches!(c, Call::DestroyTextureView(_))), 3);
}

#[test]
fn profiler_sees_passes_in_schedule_order() {
    #[derive(Default)]
    struct NameRecorder {
        begun: Vec<String>,
        commits: u32,
    }
    impl RenderGraphProfiler for NameRecorder {
        fn on_pass_begin(&mut self, pass: &str) {
            self.begun.push(pass.to_string());
        }
        fn after_commit(&mut self, _frame_index: u64) {
            self.commits += 1;
        }
    }

    let mut backend = RecordingBackend::new();
    let mut profiler = NameRecorder::default();
    let mut graph = RenderGraph::new(|_| {});

    let backbuffer = graph.create_texture(|t| {
        t.set_name("backbuffer")
            .import(TextureId(1), backbuffer_desc(320, 240), ResourceState::Undefined);
    });
    graph.add_render_pass(
        |p| {
            p.set_name("main")
                .write(0, backbuffer, LoadAction::Clear([0.0; 4]), StoreAction::Store);
        },
        |_| {},
    );
    graph.add_present_pass(|p| {
        p.set_name("present")
            .swapchain(SwapchainId(1), 0)
            .texture(backbuffer);
    });

    graph.compile().unwrap();
    graph.execute(&mut backend, Some(&mut profiler)).unwrap();

    assert_eq!(profiler.begun, vec!["main".to_string(), "present".to_string()]);
    assert_eq!(profiler.commits, 1);
}

#[test]
fn frontend_only_graph_rejects_backend_execution() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|b| {
        b.frontend_only();
    });

    let color = graph.create_texture(|t| {
        t.set_name("color").extent(16, 16, 1).allow_render_target().exported();
    });
    graph.add_render_pass(
        |p| {
            p.set_name("draw")
                .write(0, color, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    graph.compile().unwrap();
    assert!(matches!(
        graph.execute(&mut backend, None),
        Err(RenderGraphError::FrontendOnly)
    ));
    assert!(backend.calls.is_empty());

    assert_eq!(graph.execute_frontend_only().unwrap(), 1);
    assert_eq!(graph.pass_count(), 0);
}

#[test]
fn state_query_for_unrelated_pass_fails() {
    let mut graph = RenderGraph::new(|b| {
        b.frontend_only();
    });

    let a = graph.create_texture(|t| {
        t.set_name("a").extent(16, 16, 1).allow_render_target().exported();
    });
    let b = graph.create_texture(|t| {
        t.set_name("b").extent(16, 16, 1).allow_render_target().exported();
    });

    graph.add_render_pass(
        |p| {
            p.set_name("writes_a")
                .write(0, a, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );
    let writes_b = graph.add_render_pass(
        |p| {
            p.set_name("writes_b")
                .write(0, b, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    graph.compile().unwrap();
    assert!(matches!(
        graph.latest_texture_state(a, writes_b),
        Err(RenderGraphError::UnresolvedDependency { .. })
    ));
}

#[test]
fn execute_without_compile_fails() {
    let mut backend = RecordingBackend::new();
    let mut graph = RenderGraph::new(|_| {});

    let color = graph.create_texture(|t| {
        t.set_name("color").extent(16, 16, 1).allow_render_target().exported();
    });
    graph.add_render_pass(
        |p| {
            p.set_name("draw")
                .write(0, color, LoadAction::DontCare, StoreAction::Store);
        },
        |_| {},
    );

    assert!(matches!(
        graph.execute(&mut backend, None),
        Err(RenderGraphError::NotCompiled)
    ));
}
