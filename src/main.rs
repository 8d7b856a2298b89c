mod app;
mod cli;

use {
    app::App,
    clap::Parser,
    cli::Args,
    glray::logger::init_logger,
    winit::event_loop::EventLoop,
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.clone().into());

    let event_loop = EventLoop::new()?;
    let mut app = App::new(args.window(), args.shaders());
    event_loop.run_app(&mut app)?;

    app.finish()
}
