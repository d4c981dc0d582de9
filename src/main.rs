//! Connectivity doctor: runs backend selection and one cheap operation,
//! then reports what this process would use.

use garb::{Config, Wardrobe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    tracing::info!("garb starting");

    let config = Config::load();
    let preferred = config.preferred;
    let wardrobe = Wardrobe::new(config);

    let backend = wardrobe.backend().await?;
    println!("preferred backend: {preferred}");
    println!("selected backend:  {backend}");

    let recommendations = wardrobe.recommend_styles(&[], None).await?;
    println!(
        "recommendation round-trip ok ({} suggestions for an empty closet)",
        recommendations.len()
    );

    Ok(())
}
