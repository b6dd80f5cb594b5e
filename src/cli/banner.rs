//! Banner resolution command

use crate::banner::BannerTarget;
use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;
use crate::output;

/// Resolve one server banner and print its URL
pub async fn get(opts: &GlobalOptions, server: &str, image: &str) -> Result<()> {
    let target = BannerTarget::parse(server, image)?;
    let ctx = CommandContext::new(opts)?;
    let service = ctx.banner_service()?;

    let result = service.get_banner(&target).await;
    log::debug!("{} resolved from {}", target, result.source.as_str());

    output::print(&result, ctx.format)
}
