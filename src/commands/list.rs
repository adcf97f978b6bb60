//! List repository posts

use anyhow::Result;

use crate::generator::describe;
use crate::helpers::DateFormatter;
use crate::Blog;

/// Print every post, walking the index page by page
pub async fn run(blog: &Blog) -> Result<()> {
    let pagination = &blog.config.pagination;
    let paginator = blog.paginator(None);

    let mut state = paginator
        .initialize(pagination.page_size, pagination.order_by()?)
        .await?;
    let mut pages = 1;
    while state.has_more() {
        paginator.load_next(&mut state).await?;
        pages += 1;
    }

    let dates = DateFormatter::from_config(&blog.config)?;
    println!("Posts ({}, {} pages):", state.loaded.len(), pages);
    for line in describe(&state.loaded, &dates) {
        println!("{}", line);
    }

    Ok(())
}
