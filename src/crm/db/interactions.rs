use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use estate_common::lifecycle::overdue_cutoff;
use estate_common::{LifecycleAction, is_overdue};
use rusqlite::{OptionalExtension, Params, Row, named_params, params};
use tracing::debug;

use super::{CrmDb, enum_col, json_col, row_id, to_json};
use crate::crm::filters::InteractionFilter;
use crate::crm::models::*;
use crate::crm::payloads::{CompleteRequest, InteractionPatch, NewInteraction};
use crate::errors::{CrmError, CrmResult};

const INTERACTION_COLUMNS: &str = "id, customer_id, broker_id, type, title, description, \
     shared_properties, shortlisted_properties, property_id, visit_date, customer_feedback, \
     rating, scheduled_date, completed_date, next_follow_up_date, priority, status, pause_reason, \
     end_reason, reminder_sent, last_reminder_date, notes, created_at, updated_at";

fn interaction_from_row(row: &Row<'_>) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        broker_id: row.get("broker_id")?,
        kind: enum_col(row, "type")?,
        title: row.get("title")?,
        description: row.get("description")?,
        shared_properties: json_col(row, "shared_properties")?,
        shortlisted_properties: json_col(row, "shortlisted_properties")?,
        property_id: row.get("property_id")?,
        visit_date: row.get("visit_date")?,
        customer_feedback: row.get("customer_feedback")?,
        rating: row.get("rating")?,
        scheduled_date: row.get("scheduled_date")?,
        completed_date: row.get("completed_date")?,
        next_follow_up_date: row.get("next_follow_up_date")?,
        priority: enum_col(row, "priority")?,
        status: enum_col(row, "status")?,
        pause_reason: row.get("pause_reason")?,
        end_reason: row.get("end_reason")?,
        reminder_sent: row.get("reminder_sent")?,
        last_reminder_date: row.get("last_reminder_date")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn required_reason(reason: &str, action: &str) -> CrmResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CrmError::validation(format!(
            "A reason is required to {} an interaction",
            action
        )));
    }
    Ok(reason.to_string())
}

/// Apply a lifecycle action and its side effects to an in-memory interaction.
fn apply_action(
    interaction: &mut Interaction,
    action: LifecycleAction,
    completion: CompleteRequest,
    now: DateTime<Utc>,
) -> CrmResult<()> {
    let next = action.apply(interaction.status)?;
    match action {
        LifecycleAction::Start => {}
        LifecycleAction::Complete => {
            interaction.completed_date = Some(completion.completed_date.unwrap_or(now));
            if completion.customer_feedback.is_some() {
                interaction.customer_feedback = completion.customer_feedback;
            }
            if completion.rating.is_some() {
                interaction.rating = completion.rating;
            }
        }
        LifecycleAction::Pause { reason } => {
            interaction.pause_reason = Some(required_reason(&reason, "pause")?);
        }
        LifecycleAction::Resume => interaction.pause_reason = None,
        LifecycleAction::End { reason } => {
            interaction.end_reason = Some(required_reason(&reason, "end")?);
        }
    }
    interaction.status = next;
    interaction.updated_at = now;
    Ok(())
}

/// A plain status change from a full update goes through the same table as
/// the lifecycle actions, with the side effects that need no extra input.
fn apply_status_change(
    interaction: &mut Interaction,
    next: InteractionStatus,
    now: DateTime<Utc>,
) -> CrmResult<()> {
    let from = interaction.status;
    interaction.status = from.transition(next)?;
    if from == next {
        return Ok(());
    }
    match next {
        InteractionStatus::Completed if interaction.completed_date.is_none() => {
            interaction.completed_date = Some(now);
        }
        InteractionStatus::InProgress if from == InteractionStatus::Paused => {
            interaction.pause_reason = None;
        }
        _ => {}
    }
    Ok(())
}

impl CrmDb {
    // ── Interaction CRUD ──────────────────────────────────────────────

    pub fn list_interactions(
        &self,
        filter: &InteractionFilter,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Vec<InteractionWithDetails>> {
        let all = self.interactions_with_details("1 = 1", [], now, overdue_days)?;
        Ok(all.into_iter().filter(|i| filter.matches(i)).collect())
    }

    /// Open interactions untouched for longer than `overdue_days`, oldest first.
    pub fn list_overdue_interactions(
        &self,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Vec<InteractionWithDetails>> {
        let mut overdue = self.interactions_with_details(
            "status IN ('pending', 'in_progress') AND updated_at < ?1",
            params![overdue_cutoff(now, overdue_days)],
            now,
            overdue_days,
        )?;
        overdue.sort_by_key(|i| (i.interaction.updated_at, i.interaction.id));
        Ok(overdue)
    }

    pub fn get_interaction(&self, id: i64) -> CrmResult<Option<Interaction>> {
        let interaction = self
            .conn
            .query_row(
                &format!("SELECT {} FROM interactions WHERE id = ?1", INTERACTION_COLUMNS),
                params![id],
                interaction_from_row,
            )
            .optional()
            .context("Failed to query interaction")?;
        Ok(interaction)
    }

    pub fn get_interaction_details(
        &self,
        id: i64,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Option<InteractionWithDetails>> {
        self.get_interaction(id)?
            .map(|i| self.interaction_details(i, now, overdue_days))
            .transpose()
    }

    /// Records a new pending interaction and stamps the customer's last
    /// interaction date.
    pub fn create_interaction(&self, new: NewInteraction) -> CrmResult<Interaction> {
        let now = Utc::now();
        let interaction = new.into_interaction(now);
        let id = self.transaction(|db| {
            let id = db.save_interaction(&interaction)?;
            db.touch_customer(interaction.customer_id, now)?;
            Ok(id)
        })?;
        self.get_interaction(id)?
            .context("Interaction not found after insert")
            .map_err(Into::into)
    }

    /// Merge a partial update. A `status` in the patch must be a legal
    /// transition from the current status.
    pub fn update_interaction(
        &self,
        id: i64,
        mut patch: InteractionPatch,
    ) -> CrmResult<Option<Interaction>> {
        let Some(mut interaction) = self.get_interaction(id)? else {
            return Ok(None);
        };
        let now = Utc::now();
        let status = patch.status.take();
        patch.apply_to(&mut interaction);
        if let Some(next) = status {
            apply_status_change(&mut interaction, next, now)?;
        }
        interaction.updated_at = now;
        self.save_interaction(&interaction)?;
        self.get_interaction(id)
    }

    pub fn delete_interaction(&self, id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM interactions WHERE id = ?1", params![id])
            .context("Failed to delete interaction")?;
        Ok(count > 0)
    }

    /// Run `start`, `pause`, `resume` or `end` against an interaction.
    pub fn transition_interaction(
        &self,
        id: i64,
        action: LifecycleAction,
    ) -> CrmResult<Option<Interaction>> {
        self.run_lifecycle(id, action, CompleteRequest::default())
    }

    /// Complete an interaction, optionally recording when and how it went.
    pub fn complete_interaction(
        &self,
        id: i64,
        completion: CompleteRequest,
    ) -> CrmResult<Option<Interaction>> {
        self.run_lifecycle(id, LifecycleAction::Complete, completion)
    }

    fn run_lifecycle(
        &self,
        id: i64,
        action: LifecycleAction,
        completion: CompleteRequest,
    ) -> CrmResult<Option<Interaction>> {
        let Some(mut interaction) = self.get_interaction(id)? else {
            return Ok(None);
        };
        let name = action.name();
        let from = interaction.status;
        apply_action(&mut interaction, action, completion, Utc::now())?;
        self.save_interaction(&interaction)?;
        debug!(id, action = name, from = %from, to = %interaction.status, "Interaction transitioned");
        self.get_interaction(id)
    }

    fn save_interaction(&self, i: &Interaction) -> CrmResult<i64> {
        i.validate()?;
        self.ensure_exists("customers", "Customer", i.customer_id)?;
        self.ensure_exists("brokers", "Broker", i.broker_id)?;
        if let Some(property_id) = i.property_id {
            self.ensure_exists("properties", "Property", property_id)?;
        }
        let shared = to_json(&i.shared_properties, "shared properties")?;
        let shortlisted = to_json(&i.shortlisted_properties, "shortlisted properties")?;

        self.conn
            .execute(
                "INSERT INTO interactions (id, customer_id, broker_id, type, title, description,
                     shared_properties, shortlisted_properties, property_id, visit_date,
                     customer_feedback, rating, scheduled_date, completed_date,
                     next_follow_up_date, priority, status, pause_reason, end_reason,
                     reminder_sent, last_reminder_date, notes, created_at, updated_at)
                 VALUES (:id, :customer_id, :broker_id, :type, :title, :description,
                     :shared_properties, :shortlisted_properties, :property_id, :visit_date,
                     :customer_feedback, :rating, :scheduled_date, :completed_date,
                     :next_follow_up_date, :priority, :status, :pause_reason, :end_reason,
                     :reminder_sent, :last_reminder_date, :notes, :created_at, :updated_at)
                 ON CONFLICT(id) DO UPDATE SET
                     customer_id = excluded.customer_id, broker_id = excluded.broker_id,
                     type = excluded.type, title = excluded.title,
                     description = excluded.description,
                     shared_properties = excluded.shared_properties,
                     shortlisted_properties = excluded.shortlisted_properties,
                     property_id = excluded.property_id, visit_date = excluded.visit_date,
                     customer_feedback = excluded.customer_feedback, rating = excluded.rating,
                     scheduled_date = excluded.scheduled_date,
                     completed_date = excluded.completed_date,
                     next_follow_up_date = excluded.next_follow_up_date,
                     priority = excluded.priority, status = excluded.status,
                     pause_reason = excluded.pause_reason, end_reason = excluded.end_reason,
                     reminder_sent = excluded.reminder_sent,
                     last_reminder_date = excluded.last_reminder_date, notes = excluded.notes,
                     updated_at = excluded.updated_at",
                named_params! {
                    ":id": row_id(i.id),
                    ":customer_id": i.customer_id,
                    ":broker_id": i.broker_id,
                    ":type": i.kind.as_str(),
                    ":title": i.title,
                    ":description": i.description,
                    ":shared_properties": shared,
                    ":shortlisted_properties": shortlisted,
                    ":property_id": i.property_id,
                    ":visit_date": i.visit_date,
                    ":customer_feedback": i.customer_feedback,
                    ":rating": i.rating,
                    ":scheduled_date": i.scheduled_date,
                    ":completed_date": i.completed_date,
                    ":next_follow_up_date": i.next_follow_up_date,
                    ":priority": i.priority.as_str(),
                    ":status": i.status.as_str(),
                    ":pause_reason": i.pause_reason,
                    ":end_reason": i.end_reason,
                    ":reminder_sent": i.reminder_sent,
                    ":last_reminder_date": i.last_reminder_date,
                    ":notes": i.notes,
                    ":created_at": i.created_at,
                    ":updated_at": i.updated_at,
                },
            )
            .context("Failed to save interaction")?;
        Ok(row_id(i.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    /// Interactions matching `condition`, newest first, with their customer,
    /// broker, property and overdue flag filled in.
    pub(super) fn interactions_with_details(
        &self,
        condition: &str,
        params: impl Params,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Vec<InteractionWithDetails>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM interactions WHERE {} ORDER BY created_at DESC, id DESC",
                INTERACTION_COLUMNS, condition
            ))
            .context("Failed to prepare interaction query")?;
        let rows = stmt
            .query_map(params, interaction_from_row)
            .context("Failed to query interactions")?;
        let mut interactions = Vec::new();
        for row in rows {
            let i = row.context("Failed to read interaction row")?;
            interactions.push(self.interaction_details(i, now, overdue_days)?);
        }
        Ok(interactions)
    }

    fn interaction_details(
        &self,
        interaction: Interaction,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<InteractionWithDetails> {
        let customer = self.get_customer(interaction.customer_id)?.ok_or_else(|| {
            CrmError::Database(anyhow!(
                "Interaction {} references missing customer {}",
                interaction.id,
                interaction.customer_id
            ))
        })?;
        let broker = self.get_broker(interaction.broker_id)?.ok_or_else(|| {
            CrmError::Database(anyhow!(
                "Interaction {} references missing broker {}",
                interaction.id,
                interaction.broker_id
            ))
        })?;
        let property = match interaction.property_id {
            Some(id) => self.get_property(id)?,
            None => None,
        };
        let overdue = is_overdue(interaction.status, interaction.updated_at, now, overdue_days);
        Ok(InteractionWithDetails {
            interaction,
            customer,
            broker,
            property,
            overdue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use chrono::Duration;
    use InteractionStatus::*;

    fn pause(reason: &str) -> LifecycleAction {
        LifecycleAction::Pause {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_create_interaction_is_pending() -> CrmResult<()> {
        let (db, broker, customer, property) = seeded();
        let mut new = new_interaction(customer.id, broker.id, "Shared listings");
        new.kind = InteractionType::DigitalSharing;
        new.shared_properties = vec![property.id];
        let i = db.create_interaction(new)?;
        assert_eq!(i.status, Pending);
        assert_eq!(i.shared_properties, vec![property.id]);
        assert_eq!(i.created_at, i.updated_at);
        assert!(db.get_customer(customer.id)?.unwrap().last_interaction_date.is_some());
        Ok(())
    }

    #[test]
    fn test_create_interaction_requires_known_broker() -> CrmResult<()> {
        let (db, _, customer, _) = seeded();
        match db.create_interaction(new_interaction(customer.id, 99, "x")).unwrap_err() {
            CrmError::Validation(msg) => assert_eq!(msg, "Broker 99 does not exist"),
            other => panic!("Expected Validation, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_full_lifecycle() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let i = db.create_interaction(new_interaction(customer.id, broker.id, "Site visit"))?;

        let i = db.transition_interaction(i.id, LifecycleAction::Start)?.unwrap();
        assert_eq!(i.status, InProgress);

        let i = db.transition_interaction(i.id, pause("Customer travelling"))?.unwrap();
        assert_eq!(i.status, Paused);
        assert_eq!(i.pause_reason.as_deref(), Some("Customer travelling"));

        let i = db.transition_interaction(i.id, LifecycleAction::Resume)?.unwrap();
        assert_eq!(i.status, InProgress);
        assert_eq!(i.pause_reason, None);

        let i = db
            .complete_interaction(
                i.id,
                CompleteRequest {
                    customer_feedback: Some("Loved it".into()),
                    rating: Some(5),
                    ..Default::default()
                },
            )?
            .unwrap();
        assert_eq!(i.status, Completed);
        assert!(i.completed_date.is_some());
        assert_eq!(i.rating, Some(5));
        assert!(i.updated_at >= i.created_at);
        Ok(())
    }

    #[test]
    fn test_terminal_interactions_reject_actions() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let i = db.create_interaction(new_interaction(customer.id, broker.id, "Call"))?;
        let ended = db
            .transition_interaction(
                i.id,
                LifecycleAction::End {
                    reason: "Bought elsewhere".into(),
                },
            )?
            .unwrap();
        assert_eq!(ended.status, Ended);
        assert_eq!(ended.end_reason.as_deref(), Some("Bought elsewhere"));

        let err = db
            .transition_interaction(i.id, LifecycleAction::Start)
            .unwrap_err();
        assert!(matches!(
            err,
            CrmError::InvalidTransition {
                action: "start",
                from: Ended,
                ..
            }
        ));
        assert_eq!(db.get_interaction(i.id)?.unwrap().status, Ended);
        Ok(())
    }

    #[test]
    fn test_resume_requires_paused() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let i = db.create_interaction(new_interaction(customer.id, broker.id, "Call"))?;
        assert!(matches!(
            db.transition_interaction(i.id, LifecycleAction::Resume),
            Err(CrmError::InvalidTransition { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_pause_requires_reason() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let i = db.create_interaction(new_interaction(customer.id, broker.id, "Call"))?;
        assert!(matches!(
            db.transition_interaction(i.id, pause("  ")),
            Err(CrmError::Validation(_))
        ));
        assert_eq!(db.get_interaction(i.id)?.unwrap().status, Pending);
        Ok(())
    }

    #[test]
    fn test_transition_missing_interaction_is_none() -> CrmResult<()> {
        let db = CrmDb::new_in_memory()?;
        assert!(db.transition_interaction(5, LifecycleAction::Start)?.is_none());
        Ok(())
    }

    #[test]
    fn test_update_status_follows_transition_table() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let i = db.create_interaction(new_interaction(customer.id, broker.id, "Call"))?;

        let done = db
            .update_interaction(
                i.id,
                InteractionPatch {
                    status: Some(Completed),
                    notes: Some(Some("Closed on call".into())),
                    ..Default::default()
                },
            )?
            .unwrap();
        assert_eq!(done.status, Completed);
        assert!(done.completed_date.is_some());

        let err = db
            .update_interaction(
                i.id,
                InteractionPatch {
                    status: Some(Pending),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CrmError::InvalidTransition { from: Completed, to: Pending, .. }));
        Ok(())
    }

    #[test]
    fn test_overdue_detection() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let stale = db.create_interaction(new_interaction(customer.id, broker.id, "Stale"))?;
        let fresh = db.create_interaction(new_interaction(customer.id, broker.id, "Fresh"))?;
        let paused = db.create_interaction(new_interaction(customer.id, broker.id, "Paused"))?;
        db.transition_interaction(paused.id, pause("Waiting on loan"))?;

        let now = Utc::now();
        backdate(&db, "interactions", "updated_at", stale.id, now - Duration::days(21));
        backdate(&db, "interactions", "updated_at", paused.id, now - Duration::days(40));

        let overdue = db.list_overdue_interactions(now, 20)?;
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].interaction.id, stale.id);
        assert!(overdue[0].overdue);

        let filter = InteractionFilter {
            overdue: Some(true),
            ..Default::default()
        };
        let listed = db.list_interactions(&filter, now, 20)?;
        assert_eq!(listed.len(), 1);

        let fresh = db.get_interaction_details(fresh.id, now, 20)?.unwrap();
        assert!(!fresh.overdue);

        // A wider threshold clears it.
        assert!(db.list_overdue_interactions(now, 30)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_interactions_filters_by_type_and_search() -> CrmResult<()> {
        let (db, broker, customer, _) = seeded();
        let mut sharing = new_interaction(customer.id, broker.id, "Sent brochure");
        sharing.kind = InteractionType::DigitalSharing;
        db.create_interaction(sharing)?;
        db.create_interaction(new_interaction(customer.id, broker.id, "Follow up call"))?;

        let filter = InteractionFilter {
            kind: Some(InteractionType::DigitalSharing),
            ..Default::default()
        };
        let found = db.list_interactions(&filter, Utc::now(), 20)?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].interaction.title, "Sent brochure");

        let filter = InteractionFilter {
            search: Some("amit".into()),
            ..Default::default()
        };
        assert_eq!(db.list_interactions(&filter, Utc::now(), 20)?.len(), 2);
        Ok(())
    }
}
