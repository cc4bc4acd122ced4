use glam::{Vec2, Vec3};
use meshbg::{
    AnimatorConfig, CommandList, DrawCommand, FrameHandle, FrameLoop, FrameOutcome, FrameScheduler, GridLayout,
    Layout, LoopState, MeshAnimator, MeshError, MeshLayout, TorusLayout, Viewport,
};

#[derive(Default)]
struct CountingScheduler {
    requested: u64,
    cancelled: u64,
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.requested += 1;
        FrameHandle(self.requested)
    }

    fn cancel_frame(&mut self, _handle: FrameHandle) {
        self.cancelled += 1;
    }
}

#[test]
fn default_config_animates_the_torus() {
    let config = AnimatorConfig::from_json("{}").unwrap();
    let animator = MeshAnimator::new(config.layout.clone(), Viewport::new(1280.0, 720.0, 1.0)).unwrap();
    assert_eq!(animator.layout().name(), "torus");
    assert_eq!(animator.topology().vertex_count(), 64 * 24);

    let mut frame_loop = FrameLoop::new(animator, config.reduced_motion_or(false));
    let mut scheduler = CountingScheduler::default();
    let mut surface = CommandList::default();

    frame_loop.start(&mut scheduler, &mut surface);
    for i in 0..10 {
        let outcome = frame_loop.tick(1000.0 + i as f64 * 16.6, &mut scheduler, &mut surface);
        assert_eq!(outcome, FrameOutcome::Drawn);
    }
    assert_eq!(surface.frame_count(), 10);
    assert_eq!(scheduler.requested, 11);

    frame_loop.stop(&mut scheduler);
    assert_eq!(scheduler.cancelled, 1);
    assert_eq!(frame_loop.state(), LoopState::Stopped);
}

#[test]
fn reduced_motion_grid_draws_once() {
    let config = AnimatorConfig::from_json(
        r#"{"layout":{"layout":"grid","cols":12,"rows":8},"reduced_motion":true}"#,
    )
    .unwrap();
    let animator = MeshAnimator::new(config.layout.clone(), Viewport::new(800.0, 600.0, 2.0)).unwrap();
    let mut frame_loop = FrameLoop::new(animator, config.reduced_motion_or(false));
    let mut scheduler = CountingScheduler::default();
    let mut surface = CommandList::default();

    frame_loop.start(&mut scheduler, &mut surface);
    for i in 0..120 {
        frame_loop.tick(i as f64 * 16.6, &mut scheduler, &mut surface);
    }

    assert_eq!(surface.frame_count(), 1);
    assert_eq!(scheduler.requested, 0);
    assert_eq!(frame_loop.state(), LoopState::Static);
}

#[test]
fn resize_recenters_the_projection() {
    let layout = MeshLayout::Torus(TorusLayout::new(16, 8));
    let animator = MeshAnimator::new(layout, Viewport::new(800.0, 600.0, 1.0)).unwrap();
    let mut frame_loop = FrameLoop::new(animator, false);
    let mut scheduler = CountingScheduler::default();
    let mut surface = CommandList::default();

    frame_loop.start(&mut scheduler, &mut surface);
    frame_loop.tick(0.0, &mut scheduler, &mut surface);

    let resized = Viewport::new(1920.0, 1080.0, 1.5);
    frame_loop.resize(resized);
    surface.clear_commands();
    frame_loop.tick(16.0, &mut scheduler, &mut surface);

    assert_eq!(frame_loop.animator().viewport(), resized);
    assert_eq!(frame_loop.animator().project(Vec3::ZERO).screen, Vec2::new(960.0, 540.0));
    assert!(matches!(surface.commands()[0], DrawCommand::Configure(v) if v == resized));
    match &surface.commands()[2] {
        DrawCommand::FillGradient { size, .. } => assert_eq!(*size, Vec2::new(1920.0, 1080.0)),
        other => panic!("expected the fog wash, got {other:?}"),
    }
}

#[test]
fn degenerate_grid_is_rejected_before_any_frame() {
    let config = AnimatorConfig::from_json(r#"{"layout":{"layout":"grid","cols":1,"rows":9}}"#).unwrap();
    match MeshAnimator::new(config.layout, Viewport::new(800.0, 600.0, 1.0)) {
        Err(MeshError::InvalidTopologyParameters { layout, first, second }) => {
            assert_eq!((layout, first, second), ("grid", 1, 9));
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("a 1-column grid must not build"),
    }
}

#[test]
fn every_edge_references_a_projected_point() {
    for layout in [
        MeshLayout::Torus(TorusLayout::default()),
        MeshLayout::Grid(GridLayout::default()),
    ] {
        let mut animator = MeshAnimator::new(layout, Viewport::new(640.0, 480.0, 1.0)).unwrap();
        animator.update(42.0);
        let count = animator.projected().len();
        assert_eq!(count, animator.topology().vertex_count());
        assert!(animator.topology().edges().iter().all(|e| e.a < count && e.b < count));
        assert!(animator.projected().iter().all(|p| p.screen.is_finite()));
    }
}
