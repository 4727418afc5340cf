//! Demo application: a scene, a camera you can fly, and the frame loop
//!
//! Each frame runs clear -> render -> present on this thread. Keyboard and
//! mouse events arrive over a channel and signals through flags; both are
//! applied between frames.

use std::f64::consts::PI;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use thiserror::Error;

use crate::config::Config;
use crate::mesh::{self, obj::ObjError, LineMesh, Scene, TriangleMesh};
use crate::rasterizer::{
    aspect_ratio, Camera, Canvas, Cell, Color, PresentStats, Renderer, Transform,
};
use crate::terminal::{
    terminal_size, InputEvent, MouseAction, SignalFlags, TerminalSession, TerminalSink,
};

/// Camera movement per key press, in world units
const MOVE_STEP: f64 = 0.5;
/// Camera rotation per key press, in radians
const TURN_STEP: f64 = 0.02 * PI;
/// Angular speed of the animated meshes, radians per second
const SPIN: f64 = 0.5 * PI;

const SKY: Cell = Cell {
    fg: Color(0x00000000),
    bg: Color(0xff442c7d),
    depth: Cell::FAR_DEPTH,
    glyph: ' ',
};

/// Which demo to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SceneKind {
    /// Wire cube, solid cube and a random plane
    Cubes,
    /// Noise terrain under a spinning cube
    Terrain,
    /// Wire globe
    Sphere,
    /// A Wavefront OBJ model given with `--obj`
    Obj,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("the obj scene needs a model file")]
    MissingModel,

    #[error(transparent)]
    Obj(#[from] ObjError),
}

/// What the frame loop should do after an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Clear the screen and repaint every cell
    Redraw,
    Quit,
}

enum Demo {
    Cubes {
        wire: LineMesh,
        solid: TriangleMesh,
        ground: TriangleMesh,
    },
    Terrain {
        scene: Scene,
        cube: usize,
    },
    Sphere {
        globe: LineMesh,
    },
    Model {
        model: TriangleMesh,
    },
}

impl Demo {
    fn build(kind: SceneKind, obj: Option<&Path>, seed: u64) -> Result<Self, AppError> {
        let demo = match kind {
            SceneKind::Cubes => {
                let mut wire = mesh::line_cube();
                wire.transform = Transform::at(2.0, 0.0, -7.0);

                let mut solid = mesh::triangle_cube();
                solid.transform = Transform::at(-2.0, 0.0, -7.0);

                let mut ground = mesh::plane(4, 4, seed);
                ground.transform = Transform::at(0.0, 2.0, -10.0).with_scaling(3.0, 1.0, 3.0);

                Demo::Cubes { wire, solid, ground }
            }
            SceneKind::Terrain => {
                let mut cube = mesh::triangle_cube();
                cube.transform = Transform::at(0.0, -10.0, 0.0);

                let mut land = mesh::terrain(32, 32, seed as u32);
                land.transform = Transform::new().with_scaling(1.0, 0.4, 1.0);

                let mut scene = Scene::new();
                let cube = scene.add(cube);
                scene.add(land);
                Demo::Terrain { scene, cube }
            }
            SceneKind::Sphere => {
                let mut globe = mesh::line_sphere(16, 12);
                globe.transform = Transform::at(0.0, 0.0, -4.0);
                Demo::Sphere { globe }
            }
            SceneKind::Obj => {
                let path = obj.ok_or(AppError::MissingModel)?;
                let mut model = mesh::obj::load(path)?;
                model.transform = Transform::at(0.0, 0.0, -5.0);
                Demo::Model { model }
            }
        };
        Ok(demo)
    }

    /// Where the camera starts for this demo
    fn camera_start(&self) -> Transform {
        match self {
            Demo::Terrain { .. } => Transform::at(0.0, -12.0, 10.0).with_rotation(0.25, 0.0, 0.0),
            _ => Transform::new(),
        }
    }

    fn background(&self) -> Cell {
        match self {
            Demo::Terrain { .. } => SKY,
            _ => Cell::default(),
        }
    }

    fn step(&mut self, t: f64, dt: f64) {
        match self {
            Demo::Cubes { wire, solid, ground } => {
                wire.transform.rotation.x += SPIN * dt;
                wire.transform.rotation.y += SPIN * dt;
                let z = -8.0 - (t * 0.8).sin() * 2.0;
                wire.transform.translation.z = z;
                solid.transform.translation.z = z;
                ground.transform.rotation.y -= SPIN * dt;
            }
            Demo::Terrain { scene, cube } => {
                if let Some(cube) = scene.mesh_mut(*cube) {
                    cube.transform.rotation.x += SPIN * dt;
                    cube.transform.rotation.y += SPIN * dt;
                }
            }
            Demo::Sphere { globe } => {
                globe.transform.rotation.y += SPIN * 0.5 * dt;
            }
            Demo::Model { model } => {
                model.transform.rotation.y += SPIN * 0.5 * dt;
            }
        }
    }

    fn render(&self, renderer: &Renderer, canvas: &mut Canvas) -> usize {
        match self {
            Demo::Cubes { wire, solid, ground } => {
                renderer.render_line_mesh(canvas, wire)
                    + renderer.render_triangle_mesh(canvas, solid)
                    + renderer.render_triangle_mesh(canvas, ground)
            }
            Demo::Terrain { scene, .. } => renderer.render_drawable(canvas, scene),
            Demo::Sphere { globe } => renderer.render_line_mesh(canvas, globe),
            Demo::Model { model } => renderer.render_triangle_mesh(canvas, model),
        }
    }
}

pub struct App {
    canvas: Canvas,
    renderer: Renderer,
    demo: Demo,
    fps: u32,
    time: f64,
    frame: u64,
    /// Last pointer position while a button is held, as a fraction of the canvas
    drag: Option<(f64, f64)>,
}

impl App {
    pub fn new(
        config: &Config,
        kind: SceneKind,
        obj: Option<&Path>,
        seed: u64,
        width: usize,
        height: usize,
    ) -> Result<Self, AppError> {
        let demo = Demo::build(kind, obj, seed)?;

        let mut camera = Camera::new(config.lens(aspect_ratio(width, height)));
        camera.transform = demo.camera_start();
        let renderer = Renderer::new(camera)
            .with_lighting(config.lighting())
            .with_near_clip(config.near_clip);

        let mut canvas = Canvas::new(width, height);
        canvas.set_color_mode(config.color_mode);

        log::info!("{:?} scene on a {}x{} canvas at {} fps", kind, width, height, config.fps);

        Ok(Self {
            canvas,
            renderer,
            demo,
            fps: config.fps.max(1),
            time: 1.0,
            frame: 0,
            drag: None,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn camera(&self) -> &Camera {
        &self.renderer.camera
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Fixed animation step
    pub fn dt(&self) -> f64 {
        1.0 / self.fps as f64
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        log::debug!("resize to {}x{}", width, height);
        self.canvas.resize(width, height);
        self.renderer.camera.set_aspect(aspect_ratio(width, height));
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Control {
        let camera = &mut self.renderer.camera;
        match event {
            InputEvent::Quit => return Control::Quit,
            InputEvent::Key('w') => camera.translate(0.0, 0.0, -MOVE_STEP),
            InputEvent::Key('s') => camera.translate(0.0, 0.0, MOVE_STEP),
            InputEvent::Key('a') => camera.translate(-MOVE_STEP, 0.0, 0.0),
            InputEvent::Key('d') => camera.translate(MOVE_STEP, 0.0, 0.0),
            // Screen Y grows downwards, so up is -Y
            InputEvent::Key('r') => camera.translate(0.0, -MOVE_STEP, 0.0),
            InputEvent::Key('f') => camera.translate(0.0, MOVE_STEP, 0.0),
            InputEvent::Key(',') => camera.transform.rotation.y += TURN_STEP,
            InputEvent::Key('.') => camera.transform.rotation.y -= TURN_STEP,
            InputEvent::Key('z') => camera.transform.rotation.x += TURN_STEP,
            InputEvent::Key('x') => camera.transform.rotation.x -= TURN_STEP,
            InputEvent::Key('c') => {
                self.canvas.force_redraw();
                return Control::Redraw;
            }
            InputEvent::Key(_) => {}
            InputEvent::Mouse { action, x, y, .. } => {
                let w = self.canvas.width().max(1) as f64;
                let h = self.canvas.height().max(1) as f64;
                let (vx, vy) = (x as f64 / w, y as f64 / h);
                match action {
                    MouseAction::Down => self.drag = Some((vx, vy)),
                    MouseAction::Move => {
                        // A full canvas width of drag turns half a circle
                        if let Some((px, py)) = self.drag {
                            camera.transform.rotation.y += (px - vx) * PI;
                            camera.transform.rotation.x -= (py - vy) * PI;
                            self.drag = Some((vx, vy));
                        }
                    }
                    MouseAction::Up => self.drag = None,
                    MouseAction::ScrollUp => camera.translate(0.0, 0.0, -MOVE_STEP),
                    MouseAction::ScrollDown => camera.translate(0.0, 0.0, MOVE_STEP),
                }
            }
        }
        Control::Continue
    }

    /// Advance the animation by one fixed step
    pub fn step(&mut self) {
        let dt = self.dt();
        self.demo.step(self.time, dt);
        self.time += dt;
    }

    /// Clear, draw the scene and send the changes to `sink`
    pub fn render_frame<T: TerminalSink + ?Sized>(&mut self, sink: &mut T) -> io::Result<PresentStats> {
        self.canvas.clear_with(self.demo.background());
        let drawn = self.demo.render(&self.renderer, &mut self.canvas);
        let stats = self.canvas.present(sink)?;
        self.frame += 1;

        log::trace!(
            "frame {}: {} primitives, {} glyphs, {} cursor moves, {} color changes",
            self.frame,
            drawn,
            stats.glyphs,
            stats.cursor_moves,
            stats.color_changes
        );
        Ok(stats)
    }

    /// Frame loop. Returns on a quit event or quit signal, or after
    /// `max_frames` frames.
    pub fn run<W: Write>(
        &mut self,
        session: &mut TerminalSession<W>,
        input: &Receiver<InputEvent>,
        signals: &SignalFlags,
        max_frames: Option<u64>,
    ) -> io::Result<()> {
        let frame_time = Duration::from_secs_f64(self.dt());

        loop {
            let started = Instant::now();

            if signals.quit_requested() {
                log::info!("quit signal after {} frames", self.frame);
                return Ok(());
            }

            if signals.take_resize() {
                if let Some((width, height)) = terminal_size() {
                    if (width, height) != (self.canvas.width(), self.canvas.height()) {
                        self.resize(width, height);
                        session.set_size(width, height);
                        session.clear_screen()?;
                    }
                }
            }

            for event in input.try_iter() {
                match self.handle_input(event) {
                    Control::Quit => {
                        log::info!("quit after {} frames", self.frame);
                        return Ok(());
                    }
                    Control::Redraw => session.clear_screen()?,
                    Control::Continue => {}
                }
            }

            self.step();
            self.render_frame(&mut **session)?;

            if max_frames.is_some_and(|max| self.frame >= max) {
                log::info!("frame limit of {} reached", self.frame);
                return Ok(());
            }

            if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }
}
