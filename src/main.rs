use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use cube_arena::app::{self, AppState};
use cube_arena::{Demo, DemoKind, InputScript, Renderer, Scene};

const DEFAULT_FRAMES: u64 = 120;
const USAGE: &str = "Usage: cube-arena [scene.xml] [--demo static|physics] [--summary-only] [--frames N] [--input SCRIPT]";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let scene = options.load_scene()?;

    for line in app::scene_listing(&scene) {
        println!("{line}");
    }

    if options.summary_only {
        return run_headless(&scene, &options);
    }
    match run_interactive(&scene, &options) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
            );
            run_headless(&scene, &options)
        }
        Err(err) => Err(err),
    }
}

fn run_headless(scene: &Scene, options: &CliOptions) -> Result<()> {
    let demo = app::run_headless(scene, options.frames, &options.input)?;
    for line in app::run_summary(&demo) {
        println!("{line}");
    }
    Ok(())
}

fn run_interactive(scene: &Scene, options: &CliOptions) -> Result<()> {
    let demo = Demo::from_scene(scene)?;

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("Cube Arena ({} demo)", demo.kind()))
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window), demo.background()))
        .map_err(|err| WindowInitError::from_error("renderer", format!("{err:#}")))?;

    let mut app = AppState::new(renderer, demo).with_script(options.input.clone());
    let mut last_error = None;

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = app.process_event(&event, elwt) {
                last_error = Some(err);
                elwt.exit();
            }
        })
        .context("event loop terminated abnormally")?;

    for line in app::run_summary(app.demo()) {
        println!("{line}");
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

#[derive(Debug)]
struct CliOptions {
    scene: Option<PathBuf>,
    demo: Option<DemoKind>,
    summary_only: bool,
    frames: u64,
    input: InputScript,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            scene: None,
            demo: None,
            summary_only: false,
            frames: DEFAULT_FRAMES,
            input: InputScript::new(),
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--demo" => {
                    let value = expect_value(&mut args, "--demo")?;
                    options.demo = Some(value.parse()?);
                }
                "--frames" => {
                    let value = expect_value(&mut args, "--frames")?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("--frames expects a frame count, got `{value}`"))?;
                }
                "--input" => {
                    let value = expect_value(&mut args, "--input")?;
                    options.input = value.parse().context("invalid --input script")?;
                }
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                path => {
                    if options.scene.is_some() {
                        return Err(anyhow!("Only one scene file may be given\n{USAGE}"));
                    }
                    options.scene = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }

    /// Loads the scene file, or the built-in scene for the requested demo.
    fn load_scene(&self) -> Result<Scene> {
        let mut scene = match &self.scene {
            Some(path) => {
                let xml = fs::read_to_string(path)
                    .with_context(|| format!("failed to read scene {}", path.display()))?;
                Scene::from_xml(&xml)
                    .with_context(|| format!("failed to parse scene {}", path.display()))?
            }
            None => Scene::builtin(self.demo.unwrap_or(DemoKind::Physics))?,
        };
        if let Some(demo) = self.demo {
            scene.settings.demo = demo;
        }
        Ok(scene)
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_to_builtin_physics_scene() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.frames, DEFAULT_FRAMES);
        assert!(!options.summary_only);
        let scene = options.load_scene().unwrap();
        assert_eq!(scene.settings.demo, DemoKind::Physics);
    }

    #[test]
    fn parses_every_flag() {
        let options = parse(&[
            "arena.xml",
            "--demo",
            "static",
            "--summary-only",
            "--frames",
            "10",
            "--input",
            "0:down:KeyD",
        ])
        .unwrap();
        assert_eq!(options.scene, Some(PathBuf::from("arena.xml")));
        assert_eq!(options.demo, Some(DemoKind::Static));
        assert!(options.summary_only);
        assert_eq!(options.frames, 10);
        assert_eq!(options.input.len(), 1);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&["--frames"]).is_err());
        assert!(parse(&["--frames", "many"]).is_err());
        assert!(parse(&["--demo", "racing"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["a.xml", "b.xml"]).is_err());
    }
}
