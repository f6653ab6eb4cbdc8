//! `reelscan image`

use crate::cli::{CommandContext, GlobalOptions, ImageArgs, OutputFormat};
use crate::error::{Error, Result};

/// Download one TMDB image fragment, or fetch/copy an arbitrary source
pub async fn run(opts: &GlobalOptions, args: ImageArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = fetch(&ctx, &args).await;
    ctx.finish();

    let bytes = result?;
    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": args.out.display().to_string(),
                "bytes": bytes,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => println!("Saved {} bytes to {}", bytes, args.out.display()),
    }
    Ok(())
}

async fn fetch(ctx: &CommandContext, args: &ImageArgs) -> Result<u64> {
    match (&args.fragment, &args.source) {
        (Some(fragment), _) => {
            ctx.client
                .download_image(fragment, &args.out, args.kind)
                .await
        }
        (None, Some(source)) => ctx.client.download_image_from_url(source, &args.out).await,
        (None, None) => Err(Error::Other(
            "Either --fragment or --source is required".to_string(),
        )),
    }
}
