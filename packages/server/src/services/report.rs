use chrono::Utc;
use sea_orm::*;

use crate::entity::{comment, playlist, report, user};
use crate::error::AppError;
use crate::models::notification::NotificationKind;
use crate::models::report::{CreateReportRequest, ReportStatus, ReportTarget};
use crate::models::shared::{Page, PageRequest};
use crate::services::notification::{NewNotification, NotificationService};
use crate::services::target;

pub struct ReportService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReportService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    async fn ensure_target(&self, kind: ReportTarget, id: i32) -> Result<(), AppError> {
        if let Some(catalog) = kind.catalog_kind() {
            return target::ensure_exists(self.conn, catalog, id).await;
        }
        let count = match kind {
            ReportTarget::Comment => comment::Entity::find_by_id(id).count(self.conn).await?,
            ReportTarget::User => user::Entity::find_by_id(id).count(self.conn).await?,
            ReportTarget::Playlist => playlist::Entity::find_by_id(id).count(self.conn).await?,
            _ => 0,
        };
        if count == 0 {
            return Err(AppError::NotFound(format!(
                "{} {id} not found",
                kind.as_str()
            )));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        reporter_id: i32,
        payload: CreateReportRequest,
    ) -> Result<report::Model, AppError> {
        let reason = payload.reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::Validation("Reason cannot be blank".into()));
        }
        self.ensure_target(payload.target_type, payload.target_id)
            .await?;

        let model = report::ActiveModel {
            reporter_id: Set(reporter_id),
            target_type: Set(payload.target_type.as_str().to_string()),
            target_id: Set(payload.target_id),
            reason: Set(reason),
            details: Set(payload
                .details
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())),
            status: Set(report::STATUS_OPEN.to_string()),
            resolved_by: Set(None),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<report::Model>, AppError> {
        let mut query = report::Entity::find();
        if let Some(status) = status {
            query = query.filter(report::Column::Status.eq(status.as_str()));
        }
        let total = query.clone().count(self.conn).await?;
        let rows = query
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .offset(page.skip())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(Page::new(rows, total, page))
    }

    /// Close an open report and tell the reporter.
    pub async fn resolve(
        &self,
        admin_id: i32,
        id: i32,
        outcome: ReportStatus,
    ) -> Result<report::Model, AppError> {
        let existing = report::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
        if existing.status != report::STATUS_OPEN {
            return Err(AppError::Conflict(format!(
                "Report {id} is already {}",
                existing.status
            )));
        }

        let mut active: report::ActiveModel = existing.into();
        active.status = Set(outcome.as_str().to_string());
        active.resolved_by = Set(Some(admin_id));
        active.resolved_at = Set(Some(Utc::now()));
        let updated = active.update(self.conn).await?;

        let message = format!(
            "Your report on {} {} was {}",
            updated.target_type,
            updated.target_id,
            outcome.as_str()
        );
        NotificationService::new(self.conn)
            .notify_or_log(
                &[updated.reporter_id],
                NewNotification {
                    kind: NotificationKind::ReportUpdate,
                    actor_id: Some(admin_id),
                    entity: Some(("report", updated.id)),
                    message: &message,
                },
            )
            .await;
        Ok(updated)
    }
}
