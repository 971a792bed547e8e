//! Todoist REST v2 client.
//!
//! Explicitly constructed from an [`ApiConfig`] and injected where needed;
//! there is no module-level singleton. Tasks are scoped to a single project
//! (found or created by name) whose id is cached after first resolution.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tally_core::{RemoteMeta, Task, TaskBackend};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
    pub project_name: String,
}

#[derive(Debug)]
pub struct TodoistClient {
    http: reqwest::Client,
    cfg: ApiConfig,
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteTask {
    id: String,
    content: String,
    is_completed: bool,
    project_id: String,
    url: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    content: &'a str,
    project_id: &'a str,
}

#[derive(Serialize)]
struct UpdateTaskBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateProjectBody<'a> {
    name: &'a str,
    color: &'a str,
}

fn to_task(rt: RemoteTask) -> Task {
    Task {
        id: rt.id,
        text: rt.content,
        completed: rt.is_completed,
        remote: Some(RemoteMeta {
            project_id: rt.project_id,
            url: rt.url,
            created_at: rt.created_at,
        }),
    }
}

/// Pull a human-readable message out of an error body. The service sends
/// JSON with a `message` (sometimes `error`) field; fall back to the raw
/// text.
fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrBody {
        message: Option<String>,
        error: Option<String>,
    }
    if let Ok(parsed) = serde_json::from_str::<ErrBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

impl TodoistClient {
    pub fn new(cfg: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            cfg,
            project_id: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.cfg.token))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send a request, mapping transport failures and non-2xx statuses to
    /// message-string errors. A 204 comes back as a bodiless success; callers
    /// that expect a body just don't read one for those endpoints.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        if self.cfg.token.trim().is_empty() {
            bail!("API token not set; run: tally auth paste-token");
        }
        let resp = match req.headers(self.headers()?).send().await {
            Ok(resp) => resp,
            Err(err) if err.is_connect() || err.is_timeout() => {
                bail!("network unreachable: {err}");
            }
            Err(err) => return Err(err).context("todoist request"),
        };
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("todoist api error: {status} {}", extract_error_message(&body));
        }
        Ok(resp)
    }

    /// Find or create the configured project and cache its id.
    async fn ensure_project(&mut self) -> Result<String> {
        if let Some(id) = &self.project_id {
            return Ok(id.clone());
        }
        let resp = self.send(self.http.get(self.url("/projects"))).await?;
        let projects: Vec<Project> = resp.json().await.context("parse projects")?;

        let project = match projects.into_iter().find(|p| p.name == self.cfg.project_name) {
            Some(p) => p,
            None => {
                let body = CreateProjectBody {
                    name: &self.cfg.project_name,
                    color: "blue",
                };
                let resp = self
                    .send(self.http.post(self.url("/projects")).json(&body))
                    .await?;
                resp.json().await.context("parse created project")?
            }
        };
        self.project_id = Some(project.id.clone());
        Ok(project.id)
    }
}

impl TaskBackend for TodoistClient {
    async fn check_connection(&mut self) -> Result<()> {
        self.send(self.http.get(self.url("/projects"))).await?;
        Ok(())
    }

    async fn list_tasks(&mut self) -> Result<Vec<Task>> {
        let project_id = self.ensure_project().await?;
        let url = format!("{}?project_id={project_id}", self.url("/tasks"));
        let resp = self.send(self.http.get(url)).await?;
        let tasks: Vec<RemoteTask> = resp.json().await.context("parse tasks")?;
        Ok(tasks.into_iter().map(to_task).collect())
    }

    async fn create_task(&mut self, text: &str) -> Result<Task> {
        let project_id = self.ensure_project().await?;
        let body = CreateTaskBody {
            content: text,
            project_id: &project_id,
        };
        let resp = self
            .send(self.http.post(self.url("/tasks")).json(&body))
            .await?;
        let task: RemoteTask = resp.json().await.context("parse created task")?;
        Ok(to_task(task))
    }

    async fn update_task(&mut self, id: &str, text: &str) -> Result<()> {
        let body = UpdateTaskBody { content: text };
        self.send(self.http.post(self.url(&format!("/tasks/{id}"))).json(&body))
            .await?;
        Ok(())
    }

    async fn close_task(&mut self, id: &str) -> Result<()> {
        // 204 on success
        self.send(self.http.post(self.url(&format!("/tasks/{id}/close"))))
            .await?;
        Ok(())
    }

    async fn reopen_task(&mut self, id: &str) -> Result<()> {
        self.send(self.http.post(self.url(&format!("/tasks/{id}/reopen"))))
            .await?;
        Ok(())
    }

    async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/tasks/{id}"))))
            .await?;
        Ok(())
    }

    fn set_token(&mut self, token: &str) {
        self.cfg.token = token.to_string();
    }
}
