use ctxpack_build::DependencyResolver;
use ctxpack_image::ImageClient;

use super::ResolveFlags;

pub async fn deps(flags: &ResolveFlags, json: bool) -> anyhow::Result<()> {
    let settings = flags.settings()?;

    let resolver = DependencyResolver::new(ImageClient::new());
    let deps = resolver
        .dependencies(
            &settings.workspace,
            &settings.dockerfile,
            &settings.build_args,
            &settings.insecure_registries,
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deps)?);
    } else {
        for dep in &deps {
            println!("{dep}");
        }
    }
    Ok(())
}
