//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Generate the listing and every article page
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let client = blog.client()?;
    let generator = Generator::new(blog, client)?;
    let count = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} articles in {:.2}s",
        count,
        duration.as_secs_f64()
    );

    Ok(())
}
