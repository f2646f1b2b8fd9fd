use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = owlbot_postprocessor::cli::parse();
    app::run(args)
}
