//! Booking a student's slot within a day's schedule.
//!
//! A schedule holds at most one class per student. Upserting a class replaces
//! the first entry booked for the same student in place, or appends the class
//! when the student has none yet.

use crate::models::Class;

/// Where an upserted class ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Replaced(usize),
    Appended(usize),
}

pub fn upsert_class(classes: &mut Vec<Class>, incoming: Class) -> Placement {
    match classes
        .iter()
        .position(|class| class.student_id == incoming.student_id)
    {
        Some(index) => {
            classes[index] = incoming;
            Placement::Replaced(index)
        }
        None => {
            classes.push(incoming);
            Placement::Appended(classes.len() - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn class(student_id: RecordId, time: &str) -> Class {
        Class {
            student_id,
            time: time.to_string(),
            kind: "painting".to_string(),
            attendance: None,
        }
    }

    #[test]
    fn appends_new_student_after_existing_entries() {
        let (a, b, c) = (RecordId::generate(), RecordId::generate(), RecordId::generate());
        let mut classes = vec![class(a, "09:00"), class(b, "10:00")];

        assert_eq!(upsert_class(&mut classes, class(c, "11:00")), Placement::Appended(2));
        assert_eq!(
            classes.iter().map(|c| c.student_id).collect::<Vec<_>>(),
            vec![a, b, c]
        );
        assert_eq!(classes[0].time, "09:00");
        assert_eq!(classes[1].time, "10:00");
    }

    #[test]
    fn replaces_in_place_for_booked_student() {
        let (a, b) = (RecordId::generate(), RecordId::generate());
        let mut classes = vec![class(a, "09:00"), class(b, "10:00")];

        let mut rebooked = class(a, "12:30");
        rebooked.attendance = Some(true);
        assert_eq!(upsert_class(&mut classes, rebooked.clone()), Placement::Replaced(0));
        assert_eq!(classes, vec![rebooked, class(b, "10:00")]);
    }

    #[test]
    fn repeated_upsert_keeps_single_entry_with_latest_values() {
        let a = RecordId::generate();
        let mut classes = Vec::new();

        upsert_class(&mut classes, class(a, "09:00"));
        upsert_class(&mut classes, class(a, "15:00"));

        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].time, "15:00");
    }

    #[test]
    fn only_first_duplicate_is_replaced() {
        let a = RecordId::generate();
        let mut classes = vec![class(a, "09:00"), class(a, "10:00")];

        assert_eq!(upsert_class(&mut classes, class(a, "11:00")), Placement::Replaced(0));
        assert_eq!(classes[0].time, "11:00");
        assert_eq!(classes[1].time, "10:00");
    }
}
