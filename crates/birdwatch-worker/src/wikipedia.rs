//! The reference external processor: looks a job's name up on Wikipedia and
//! returns its introductory extract as `{"research": extract}`.

use anyhow::{anyhow, bail};
use birdwatch_core::{async_trait, Job, Processor};
use serde_json::{json, Value};

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";

pub struct WikipediaProcessor {
    client: reqwest::Client,
}

impl WikipediaProcessor {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("birdwatch-worker")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

impl Default for WikipediaProcessor {
    fn default() -> Self {
        Self::new().expect("failed to construct reqwest client for Wikipedia processor")
    }
}

#[async_trait]
impl Processor for WikipediaProcessor {
    async fn process(&self, job: &Job) -> anyhow::Result<Value> {
        let response = self
            .client
            .get(API_BASE)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", job.name.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("wikipedia API returned {}", response.status());
        }

        let payload: Value = response.json().await?;
        let page = payload
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|pages| pages.get(0))
            .ok_or_else(|| anyhow!("wikipedia response missing query.pages[0]"))?;

        if page.get("missing").is_some() {
            bail!("wikipedia has no page titled '{}'", job.name);
        }

        let extract = page
            .get("extract")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("wikipedia page for '{}' has no extract", job.name))?;

        Ok(json!({ "research": extract }))
    }
}
