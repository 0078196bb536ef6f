use std::io::Write;
use std::path::Path;

use anyhow::Context;
use ctxpack_build::{DependencyResolver, PipeReader};
use ctxpack_image::ImageClient;

use super::ResolveFlags;

pub async fn context(flags: &ResolveFlags, output: &Path) -> anyhow::Result<()> {
    let settings = flags.settings()?;

    let resolver = DependencyResolver::new(ImageClient::new());
    let reader = resolver
        .stream_context(
            &settings.workspace,
            &settings.dockerfile,
            &settings.build_args,
            &settings.insecure_registries,
            settings.channel_capacity,
        )
        .await?;

    let output = output.to_path_buf();
    let written = tokio::task::spawn_blocking(move || copy_to_output(reader, &output))
        .await
        .context("archive writer task panicked")??;

    tracing::info!(bytes = written, "build context written");
    Ok(())
}

/// Copy the archive to `output`, where `-` means stdout.
fn copy_to_output(mut reader: PipeReader, output: &Path) -> anyhow::Result<u64> {
    if output.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        let written = std::io::copy(&mut reader, &mut stdout).context("writing build context")?;
        stdout.flush().context("flushing stdout")?;
        return Ok(written);
    }

    let mut file = std::io::BufWriter::new(
        std::fs::File::create(output)
            .with_context(|| format!("creating {}", output.display()))?,
    );
    let written = std::io::copy(&mut reader, &mut file).context("writing build context")?;
    file.flush()
        .with_context(|| format!("flushing {}", output.display()))?;
    Ok(written)
}
