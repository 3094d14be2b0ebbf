//! In-memory [`GlueApi`] for command tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use glue_proto::{
    CreateDeployment, CreateGlue, Deployment, DeploymentId, DeploymentSnapshot, DeploymentStatus,
    Glue, GlueId, LogPage, User,
};
use glue_stream::{DeploymentFetcher, LogFetcher, StreamResult};

use crate::client::GlueApi;
use crate::error::CliError;

#[derive(Default)]
pub struct FakeApi {
    pub user: Option<User>,
    pub glues: Mutex<Vec<Glue>>,
    pub deployments: Vec<Deployment>,
    pub snapshots: Mutex<VecDeque<Option<DeploymentSnapshot>>>,
    pub log_pages: Mutex<VecDeque<LogPage>>,
    pub uploads: Mutex<Vec<(GlueId, CreateDeployment)>>,
}

pub fn glue(id: &str, name: &str) -> Glue {
    Glue {
        id: GlueId::parse(id).expect("valid"),
        name: name.into(),
        description: None,
        archived: false,
        tags: vec![],
        current_deployment_id: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        updated_at: None,
    }
}

pub fn deployment(id: &str, status: DeploymentStatus) -> Deployment {
    Deployment {
        id: DeploymentId::parse(id).expect("valid"),
        glue_id: GlueId::parse("g_1").expect("valid"),
        status,
        created_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        finished_at: None,
    }
}

impl FakeApi {
    pub fn with_user(mut self, email: &str) -> Self {
        self.user = Some(User {
            id: "u_1".into(),
            email: email.into(),
            name: None,
        });
        self
    }

    pub fn with_glue(self, glue: Glue) -> Self {
        self.glues.lock().expect("lock").push(glue);
        self
    }

    pub fn with_snapshots(self, snapshots: Vec<Option<DeploymentSnapshot>>) -> Self {
        *self.snapshots.lock().expect("lock") = snapshots.into();
        self
    }

    pub fn with_log_pages(self, pages: Vec<LogPage>) -> Self {
        *self.log_pages.lock().expect("lock") = pages.into();
        self
    }

    pub fn glue_by_id(&self, id: &str) -> Option<Glue> {
        self.glues
            .lock()
            .expect("lock")
            .iter()
            .find(|g| g.id.as_str() == id)
            .cloned()
    }

    fn update_glue(&self, id: &GlueId, f: impl FnOnce(&mut Glue)) -> Result<Glue, CliError> {
        let mut glues = self.glues.lock().expect("lock");
        let glue = glues
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| CliError::NotFound(format!("glue {id}")))?;
        f(glue);
        Ok(glue.clone())
    }
}

impl GlueApi for FakeApi {
    async fn me(&self) -> Result<User, CliError> {
        self.user
            .clone()
            .ok_or_else(|| CliError::Auth("invalid token".into()))
    }

    async fn list_glues(&self, include_archived: bool) -> Result<Vec<Glue>, CliError> {
        Ok(self
            .glues
            .lock()
            .expect("lock")
            .iter()
            .filter(|g| include_archived || !g.archived)
            .cloned()
            .collect())
    }

    async fn get_glue(&self, id: &GlueId) -> Result<Glue, CliError> {
        self.glue_by_id(id.as_str())
            .ok_or_else(|| CliError::NotFound(format!("glue {id}")))
    }

    async fn create_glue(&self, body: &CreateGlue) -> Result<Glue, CliError> {
        let mut created = glue("g_new", &body.name);
        created.description.clone_from(&body.description);
        self.glues.lock().expect("lock").push(created.clone());
        Ok(created)
    }

    async fn archive_glue(&self, id: &GlueId) -> Result<Glue, CliError> {
        self.update_glue(id, |g| g.archived = true)
    }

    async fn set_tags(&self, id: &GlueId, tags: &[String]) -> Result<Glue, CliError> {
        self.update_glue(id, |g| g.tags = tags.to_vec())
    }

    async fn create_deployment(
        &self,
        id: &GlueId,
        body: &CreateDeployment,
    ) -> Result<Deployment, CliError> {
        self.get_glue(id).await?;
        self.uploads
            .lock()
            .expect("lock")
            .push((id.clone(), body.clone()));
        Ok(deployment("dep_1", DeploymentStatus::Pending))
    }

    async fn list_deployments(&self, id: &GlueId) -> Result<Vec<Deployment>, CliError> {
        self.get_glue(id).await?;
        Ok(self.deployments.clone())
    }

    async fn get_deployment(
        &self,
        _id: &DeploymentId,
    ) -> Result<Option<DeploymentSnapshot>, CliError> {
        self.snapshots
            .lock()
            .expect("lock")
            .pop_front()
            .ok_or_else(|| CliError::Connection("no more scripted snapshots".into()))
    }

    async fn logs_page(
        &self,
        _id: &GlueId,
        _cursor: Option<&str>,
        _limit: u32,
    ) -> Result<LogPage, CliError> {
        Ok(self
            .log_pages
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_default())
    }
}

impl DeploymentFetcher for FakeApi {
    async fn fetch_deployment_with_logs(
        &self,
        id: &DeploymentId,
    ) -> StreamResult<Option<DeploymentSnapshot>> {
        self.get_deployment(id).await.map_err(CliError::into_stream_error)
    }
}

impl LogFetcher for FakeApi {
    async fn fetch_logs(
        &self,
        glue_id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> StreamResult<LogPage> {
        self.logs_page(glue_id, cursor, limit)
            .await
            .map_err(CliError::into_stream_error)
    }
}
