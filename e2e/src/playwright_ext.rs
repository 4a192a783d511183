use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use playwright::api::{
    page::{Event, Page},
    response::Response,
};
use serde::Serialize;

#[async_trait]
pub trait PageJsonExt {
    /// POSTs `body` as JSON from inside the page and returns the matching
    /// response.
    async fn post_json<S: Serialize + Send>(&self, url: &str, body: S) -> Result<Response>;
}

#[async_trait]
impl PageJsonExt for Page {
    async fn post_json<S: Serialize + Send>(&self, url: &str, body: S) -> Result<Response> {
        let body = serde_json::to_value(body)?;

        // Each request carries a per-page sequence number so concurrent
        // posts cannot pick up each other's responses.
        let seq = self
            .eval::<u32>(r#"() => window.postJsonSeq = (window.postJsonSeq ?? 0) + 1"#)
            .await?;

        // Subscribe before dispatching the fetch so the response cannot slip
        // past us.
        let mut responses = Box::pin(self.subscribe_event()?.filter_map(
            move |event_result| async move {
                match event_result {
                    Err(err) => Some(Err(err)),
                    Ok(Event::Response(response))
                        if response.request().headers().ok().and_then(|headers| {
                            headers
                                .get("x-post-json-seq")
                                .and_then(|header| header.parse::<u32>().ok())
                        }) == Some(seq) =>
                    {
                        Some(Ok(response))
                    }
                    Ok(_) => None,
                }
            },
        ));

        self.evaluate::<_, ()>(
            r#"([url, body, seq]) => {
            fetch(url, { method: "POST", body: JSON.stringify(body), headers: new Headers({ "x-post-json-seq": seq, "Content-Type": "application/json" }) });
        }"#,
            (url, body, seq),
        )
        .await?;

        match responses.next().await {
            Some(response) => Ok(response?),
            None => Err(anyhow!("event stream closed before the response to {} arrived", url)),
        }
    }
}
