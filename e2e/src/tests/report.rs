use crate::{playwright_ext::PageJsonExt, Context};
use anyhow::Result;
use common::FillReport;

#[test_case]
async fn report_filled_value(ctx: Context) -> Result<()> {
    ctx.page
        .goto_builder("http://127.0.0.1:8000/input/textarea")
        .goto()
        .await?;
    ctx.page.click_builder("textarea").click().await?;
    ctx.page
        .fill_builder("textarea", "observed by the fixture")
        .fill()
        .await?;

    let value = ctx.page.eval::<String>("() => window.result").await?;
    let input_events = ctx.page.eval::<u32>("() => window.inputEvents").await?;

    // The server asserts the payload describes a real fill.
    let response = ctx
        .page
        .post_json(
            "/input/report",
            FillReport {
                value,
                input_events,
            },
        )
        .await?;
    assert_eq!(response.status()?, 200);
    assert_eq!(response.request().method()?, "POST");

    Ok(())
}
