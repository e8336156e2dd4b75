use anyhow::{Context, bail};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn};

use archigen::args::{Args, Command};
use archigen::{
    Config, GenerationClient, GenerationRequest, ImageEditSession, Pipeline, Rasterizer,
    SceneEditor, Status, connect, export, logger, scene,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.log_level);

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(key) = args.api_key.clone() {
        config = config.with_api_key(key);
    }
    if args.command.needs_credential() {
        config.require_api_key()?;
    }

    match args.command {
        Command::Visualize { prompt, mode, out } => {
            visualize(&config, GenerationRequest::new(prompt, mode), &out).await
        }
        Command::Layout {
            prompt,
            render,
            out,
        } => layout(&config, &prompt, render, &out).await,
        Command::Edit { image, prompt, out } => edit(&config, &image, &prompt, &out).await,
        Command::Export { svg, size, out } => {
            let markup = tokio::fs::read_to_string(&svg)
                .await
                .with_context(|| format!("reading {}", svg.display()))?;
            let rasterizer = Rasterizer::new(size, size)
                .fallback_size(1000.0, 1000.0)
                .timeout(config.raster_timeout());
            let path = export::export_drawing_with(&out, &markup, &rasterizer).await?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn client(config: &Config) -> anyhow::Result<GenerationClient> {
    Ok(GenerationClient::new(connect(config)?))
}

async fn visualize(config: &Config, request: GenerationRequest, out: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::with_rasterizer(
        client(config)?,
        Rasterizer::snapshot().timeout(config.raster_timeout()),
    );
    let mut progress = pipeline.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last = Status::Idle;
        while progress.changed().await.is_ok() {
            let status = progress.borrow_and_update().status;
            if status != last {
                println!("{status}");
                last = status;
            }
        }
    });

    let handle = pipeline.submit(request);
    let session = tokio::select! {
        res = handle => res.context("generation task failed")?,
        _ = tokio::signal::ctrl_c() => {
            pipeline.stop().await;
            Some(pipeline.snapshot().await)
        }
    };
    reporter.abort();

    let Some(session) = session else {
        bail!("session was superseded");
    };
    match session.status {
        Status::Error => bail!(session.error.unwrap_or_else(|| "generation failed".into())),
        Status::Stopped => {
            println!("stopped");
            return Ok(());
        }
        _ => {}
    }

    tokio::fs::create_dir_all(out).await?;
    if let Some(markup) = &session.drawing_markup {
        tokio::fs::write(out.join("blueprint.svg"), markup).await?;
        let rasterizer = Rasterizer::export().timeout(config.raster_timeout());
        match export::export_drawing_with(out, markup, &rasterizer).await {
            Ok(path) => println!("{}", path.display()),
            Err(e) => warn!(error = %e, "drawing export failed"),
        }
    }
    for render in &session.renders {
        let path = export::write_image(out, &render.label, &render.image).await?;
        println!("{}: {}", render.caption, path.display());
    }
    info!(
        drawing = ?session.drawing_time,
        renders = ?session.render_time,
        "generation finished"
    );
    Ok(())
}

async fn layout(config: &Config, prompt: &str, render: bool, out: &Path) -> anyhow::Result<()> {
    let client = client(config)?;
    let mut editor =
        SceneEditor::new().with_rasterizer(Rasterizer::snapshot().timeout(config.raster_timeout()));
    editor
        .generate_layout(&client, prompt)
        .await
        .context(scene::LAYOUT_FAILED)?;
    println!("{}", serde_json::to_string_pretty(editor.scene())?);

    tokio::fs::create_dir_all(out).await?;
    tokio::fs::write(out.join("scene.svg"), editor.snapshot_svg()).await?;
    if render {
        let image = editor
            .render_perspective(&client)
            .await
            .context("perspective render failed")?
            .clone();
        let path = export::write_image(out, "perspective", &image).await?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn edit(config: &Config, image: &Path, prompt: &str, out: &Path) -> anyhow::Result<()> {
    let client = client(config)?;
    let mut session = ImageEditSession::new();
    session
        .load_file(image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;
    let Some(edited) = session.apply(&client, prompt).await.cloned() else {
        bail!(
            session
                .error()
                .unwrap_or("nothing to edit: empty prompt")
                .to_string()
        );
    };
    let path = export::write_image(out, "edited", &edited).await?;
    println!("{}", path.display());
    Ok(())
}
