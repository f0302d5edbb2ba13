use axum::body::Bytes;
use axum::extract::Path;
use axum::Extension;
use serde_json::{Map, Value};

use super::{created, decode, parse_id, proceeds, Notice, Payload};
use crate::err::Error;
use crate::gateway::{Collection, SharedGateway, UpdateOutcome};
use crate::models::{validate_student_patch, NewStudent, RecordId, Student};

fn missing(id: RecordId) -> Error {
    Error::not_found(format!("No student found with the provided id: {}", id))
}

pub async fn create(Extension(gateway): Extension<SharedGateway>, body: Bytes) -> Payload<Student> {
    let fields = decode::<NewStudent>(&body)?.validate()?;
    let id = RecordId::generate();

    gateway
        .insert(Collection::Students, id, serde_json::to_value(&fields)?)
        .await?;

    log::info!("Created student {}: {}, {}", id, fields.full_name, fields.phone);
    created(Student { id, fields })
}

pub async fn list(Extension(gateway): Extension<SharedGateway>) -> Payload<Vec<Student>> {
    let students = gateway
        .find_all(Collection::Students)
        .await?
        .into_iter()
        .map(Student::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Listed {} students", students.len());
    proceeds(students)
}

pub async fn get_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
) -> Payload<Student> {
    let id = parse_id(&id)?;
    let doc = gateway
        .find_by_id(Collection::Students, id)
        .await?
        .ok_or_else(|| missing(id))?;

    log::info!("Fetched student {}", id);
    proceeds(Student::try_from(doc)?)
}

pub async fn update_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
    body: Bytes,
) -> Notice {
    let id = parse_id(&id)?;
    let patch = validate_student_patch(decode::<Map<String, Value>>(&body)?)?;
    let changed = patch.keys().cloned().collect::<Vec<_>>();

    match gateway
        .update_by_id(Collection::Students, id, patch, None)
        .await?
    {
        UpdateOutcome::Updated => {}
        UpdateOutcome::NotFound | UpdateOutcome::Conflict => return Err(missing(id)),
    }

    log::info!("Updated student {}: {}", id, changed.join(", "));
    Ok(format!(
        "Student with id {} fields updated successfully: [{}]",
        id,
        changed.join(", ")
    ))
}

pub async fn delete_by_id(
    Path(id): Path<String>,
    Extension(gateway): Extension<SharedGateway>,
) -> Notice {
    let id = parse_id(&id)?;
    if !gateway.delete_by_id(Collection::Students, id).await? {
        return Err(missing(id));
    }

    log::info!("Deleted student {}", id);
    Ok(format!("Deleted student by mentioned id: {}", id))
}
