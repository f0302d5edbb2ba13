use axum::body::Bytes;
use axum::extract::Path;
use axum::Extension;
use serde_json::{Map, Value};

use super::{created, decode, parse_id, proceeds, Notice, Payload, SchedulePolicy};
use crate::err::Error;
use crate::gateway::{Collection, SharedGateway, UpdateOutcome};
use crate::models::{Class, RecordId, Schedule, ScheduleDocument, ScheduleFields};
use crate::reconcile::upsert_class;

fn missing(id: RecordId) -> Error {
    Error::not_found(format!("No schedule found with the provided id: {}", id))
}

pub async fn create(
    Extension(gateway): Extension<SharedGateway>,
    Extension(policy): Extension<SchedulePolicy>,
    body: Bytes,
) -> Payload<Schedule> {
    let fields = decode::<ScheduleFields>(&body)?;
    if fields.classes.is_empty() && !policy.allow_empty {
        return Err(Error::validation("No classes found for schedule creation"));
    }

    let id = RecordId::generate();
    let stored = ScheduleDocument {
        fields,
        revision: 0,
    };
    gateway
        .insert(Collection::Schedule, id, serde_json::to_value(&stored)?)
        .await?;

    log::info!(
        "Created schedule {} for {} with {} classes",
        id,
        stored.fields.date,
        stored.fields.classes.len()
    );
    created(Schedule {
        id,
        fields: stored.fields,
    })
}

pub async fn list(Extension(gateway): Extension<SharedGateway>) -> Payload<Vec<Schedule>> {
    let schedules = gateway
        .find_all(Collection::Schedule)
        .await?
        .into_iter()
        .map(Schedule::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Listed {} schedules", schedules.len());
    proceeds(schedules)
}

pub async fn get_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
) -> Payload<Schedule> {
    let id = parse_id(&id)?;
    let doc = gateway
        .find_by_id(Collection::Schedule, id)
        .await?
        .ok_or_else(|| missing(id))?;

    log::info!("Fetched schedule {}", id);
    proceeds(Schedule::try_from(doc)?)
}

/// Books or rebooks one student's class. The whole class list is written
/// back only if nobody else reconciled the schedule since it was read.
pub async fn update_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
    body: Bytes,
) -> Notice {
    let id = parse_id(&id)?;
    let doc = gateway
        .find_by_id(Collection::Schedule, id)
        .await?
        .ok_or_else(|| missing(id))?;

    let class = decode::<Class>(&body)?;
    let student_id = class.student_id;
    let mut current = ScheduleDocument::try_from(doc)?;
    let placement = upsert_class(&mut current.fields.classes, class);

    let mut patch = Map::new();
    patch.insert(
        "classes".to_string(),
        serde_json::to_value(&current.fields.classes)?,
    );
    patch.insert("revision".to_string(), Value::from(current.revision + 1));

    match gateway
        .update_by_id(Collection::Schedule, id, patch, Some(current.revision))
        .await?
    {
        UpdateOutcome::Updated => {}
        UpdateOutcome::NotFound => return Err(missing(id)),
        UpdateOutcome::Conflict => {
            return Err(Error::conflict(format!(
                "Schedule {} was changed by another request, retry the update",
                id
            )))
        }
    }

    log::info!(
        "Reconciled class for student {} in schedule {}: {:?}",
        student_id,
        id,
        placement
    );
    Ok(format!("Schedule {} updated successfully", id))
}

pub async fn delete_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
) -> Notice {
    let id = parse_id(&id)?;
    if !gateway.delete_by_id(Collection::Schedule, id).await? {
        return Err(missing(id));
    }

    log::info!("Deleted schedule {}", id);
    Ok(format!("Deleted schedule by mentioned id: {}", id))
}
