// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-file backed alarm scheduler used by the daemon

use super::{AlarmScheduler, SchedulerError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tk_core::{AlarmId, AlarmInstance, AlarmRequest};
use tokio::sync::Mutex;

/// An alarm whose trigger instant has passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueAlarm {
    pub id: AlarmId,
    pub request: AlarmRequest,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AlarmFile {
    alarms: BTreeMap<AlarmId, AlarmRequest>,
}

/// Alarm scheduler persisting materialized alarms to a JSON file.
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Clone)]
pub struct FileAlarmScheduler {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileAlarmScheduler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<AlarmFile, SchedulerError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(AlarmFile::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AlarmFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, file: &AlarmFile) -> Result<(), SchedulerError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(file)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Remove and return every alarm due at or before `now`, earliest first
    pub async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<DueAlarm>, SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;

        let due_ids: Vec<AlarmId> = file
            .alarms
            .iter()
            .filter(|(_, request)| request.fire_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        if due_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut due: Vec<DueAlarm> = due_ids
            .into_iter()
            .filter_map(|id| {
                file.alarms
                    .remove(&id)
                    .map(|request| DueAlarm { id, request })
            })
            .collect();
        due.sort_by_key(|alarm| alarm.request.fire_at);

        self.store(&file).await?;
        Ok(due)
    }
}

#[async_trait]
impl AlarmScheduler for FileAlarmScheduler {
    async fn list_instances(&self) -> Result<Vec<AlarmInstance>, SchedulerError> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Ok(file
            .alarms
            .into_iter()
            .map(|(id, request)| AlarmInstance {
                id,
                fire_at: request.fire_at,
            })
            .collect())
    }

    async fn create(&self, id: &AlarmId, request: &AlarmRequest) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        if file.alarms.contains_key(id) {
            return Err(SchedulerError::AlreadyExists(id.clone()));
        }
        file.alarms.insert(id.clone(), request.clone());
        self.store(&file).await
    }

    async fn cancel(&self, id: &AlarmId) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        if file.alarms.remove(id).is_none() {
            return Err(SchedulerError::NotFound(id.clone()));
        }
        self.store(&file).await
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
