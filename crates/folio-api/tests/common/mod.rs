//! Shared helpers for API tests: in-memory repositories and request helpers.
//!
//! The router runs against these stores, so API tests need no database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use folio_api::{build_router, AppState, ServerConfig};
use folio_core::{
    page_number_value, AdjacentDirection, AnnotationPatch, Error, Page, PageMetadataUpdate,
    PageRepository, PageSearchRequest, Project, ProjectRepository, ProjectUpdate, Result,
};

// =============================================================================
// IN-MEMORY PAGES
// =============================================================================

#[derive(Default)]
pub struct MemoryPages {
    pages: Mutex<Vec<Page>>,
}

impl MemoryPages {
    pub fn all(&self) -> Vec<Page> {
        self.pages.lock().unwrap().clone()
    }

    pub fn find(&self, id: Uuid) -> Option<Page> {
        self.pages.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }
}

/// True when `values` is empty or any value passes `test`.
fn any_match(values: &[String], test: impl Fn(&str) -> bool) -> bool {
    values.is_empty() || values.iter().any(|v| test(v.as_str()))
}

fn matches_search(page: &Page, request: &PageSearchRequest) -> bool {
    let date = page.date.as_deref().unwrap_or("");

    any_match(&request.volume, |v| page.volume_title == v)
        && any_match(&request.page_number, |v| page.page_number.trim() == v)
        && any_match(&request.date, |v| date == v)
        && any_match(&request.topics, |v| page.topics.iter().any(|t| t == v))
        && any_match(&request.keywords, |v| {
            let needle = v.to_lowercase();
            page.keywords.to_lowercase().contains(&needle)
                || page.text.to_lowercase().contains(&needle)
        })
        && request.year.as_deref().map_or(true, |y| date.contains(y))
}

fn sort_pages(pages: &mut [Page]) {
    pages.sort_by(|a, b| {
        a.volume_title
            .cmp(&b.volume_title)
            .then(a.page_number_value().cmp(&b.page_number_value()))
            .then(a.id.cmp(&b.id))
    });
}

#[async_trait]
impl PageRepository for MemoryPages {
    async fn insert(&self, page: &Page) -> Result<()> {
        self.pages.lock().unwrap().push(page.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Page>> {
        Ok(self.find(id))
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Page>> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search(&self, request: &PageSearchRequest, limit: i64) -> Result<Vec<Page>> {
        let mut found: Vec<Page> = self
            .all()
            .into_iter()
            .filter(|p| matches_search(p, request))
            .collect();
        sort_pages(&mut found);
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn adjacent(&self, page: &Page, direction: AdjacentDirection) -> Result<Option<Page>> {
        let current = page.page_number_value();
        let mut same_volume: Vec<Page> = self
            .all()
            .into_iter()
            .filter(|p| p.volume_title == page.volume_title)
            .collect();
        sort_pages(&mut same_volume);

        Ok(match direction {
            AdjacentDirection::Next => same_volume
                .into_iter()
                .find(|p| page_number_value(&p.page_number) > current),
            AdjacentDirection::Previous => same_volume
                .into_iter()
                .rev()
                .find(|p| page_number_value(&p.page_number) < current),
        })
    }

    async fn list_dates(&self) -> Result<Vec<String>> {
        let mut dates: Vec<String> = self
            .all()
            .into_iter()
            .filter_map(|p| p.date)
            .filter(|d| !d.trim().is_empty())
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn update_metadata(&self, id: Uuid, update: &PageMetadataUpdate) -> Result<bool> {
        let mut pages = self.pages.lock().unwrap();
        let Some(page) = pages.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        if let Some(date) = &update.date {
            page.date = date.clone();
        }
        if let Some(topics) = &update.topics {
            page.topics = topics.clone();
        }
        Ok(true)
    }
}

// =============================================================================
// IN-MEMORY PROJECTS
// =============================================================================

#[derive(Default)]
pub struct MemoryProjects {
    projects: Mutex<Vec<Project>>,
}

impl MemoryProjects {
    pub fn find(&self, id: Uuid) -> Option<Project> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Store a project as-is, bypassing the update path.
    pub fn put(&self, project: Project) {
        let mut projects = self.projects.lock().unwrap();
        projects.retain(|p| p.id != project.id);
        projects.push(project);
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjects {
    async fn create(&self) -> Result<Project> {
        let project = Project::empty(Uuid::now_v7(), Utc::now());
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.find(id))
    }

    async fn list(&self) -> Result<Vec<Project>> {
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn update(&self, id: Uuid, update: &ProjectUpdate) -> Result<bool> {
        let mut projects = self.projects.lock().unwrap();
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        project.apply_update(update, Utc::now());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut projects = self.projects.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() < before)
    }

    async fn merge_page_annotation(
        &self,
        project_id: Uuid,
        page_id: Uuid,
        patch: &AnnotationPatch,
    ) -> Result<bool> {
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(Error::ProjectNotFound(project_id))?;

        let merged = project
            .page_metadata
            .get(&page_id)
            .cloned()
            .unwrap_or_default()
            .merged(patch);
        project.page_metadata.insert(page_id, merged);
        project.updated_at_utc = Utc::now();
        Ok(true)
    }
}

// =============================================================================
// TEST APP
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub pages: Arc<MemoryPages>,
    pub projects: Arc<MemoryProjects>,
}

impl TestApp {
    pub fn new() -> Self {
        let pages = Arc::new(MemoryPages::default());
        let projects = Arc::new(MemoryProjects::default());
        let state = AppState::new(pages.clone(), projects.clone());
        let router = build_router(state, &ServerConfig::default());
        Self {
            router,
            pages,
            projects,
        }
    }

    /// Seed a page directly into the store.
    pub async fn seed_page(&self, volume: &str, page_number: &str, date: Option<&str>) -> Page {
        let page = Page {
            id: Uuid::new_v4(),
            volume_title: volume.to_string(),
            page_number: page_number.to_string(),
            text: format!("Text of {} page {}", volume, page_number),
            date: date.map(str::to_string),
            topics: Vec::new(),
            keywords: String::new(),
        };
        self.pages.insert(&page).await.unwrap();
        page
    }

    /// Create a project through the API and return its id.
    pub async fn create_project(&self) -> Uuid {
        let (status, body) = self.post("/api/project/create", Value::Null).await;
        assert_eq!(status, StatusCode::CREATED);
        body["project"]["_id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("created project should have an _id")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}
