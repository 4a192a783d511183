#![feature(custom_test_frameworks)]
#![test_runner(e2e::e2e_test_runner)]

use anyhow::Result;
use e2e::Context;

#[test_case]
async fn fill_textarea(ctx: Context) -> Result<()> {
    ctx.page
        .goto_builder("http://127.0.0.1:8000/input/textarea")
        .goto()
        .await?;
    ctx.page.click_builder("textarea").click().await?;
    ctx.page.fill_builder("textarea", "test").fill().await?;

    let value = ctx
        .page
        .eval::<String>("() => document.querySelector('textarea').value")
        .await?;
    assert_eq!(value, "test");

    Ok(())
}
