use mocca_core::constants::UNKNOWN_ORGANIZER_MARKER;

use crate::rfc::ical::core::Component;

/// Builds the plain-text description stored for an imported event.
///
/// Organizer, attendees and location become labelled header lines, followed
/// by a blank line and the event's own `DESCRIPTION`. Organizers written as
/// the exporter's "unknown organizer" placeholder are left out.
#[must_use]
pub fn assemble_description(event: &Component) -> String {
    let mut header: Vec<String> = Vec::new();

    if let Some(organizer) = event.get_property("ORGANIZER")
        && !organizer.raw_value.contains(UNKNOWN_ORGANIZER_MARKER)
    {
        header.push(format!("Organizer: {}", organizer.raw_value));
    }
    header.extend(
        event
            .get_properties("ATTENDEE")
            .into_iter()
            .map(|attendee| format!("Attendee: {}", attendee.raw_value)),
    );
    if let Some(location) = event.get_property("LOCATION") {
        header.push(format!("Location: {}", location.text()));
    }

    let body = event
        .get_property("DESCRIPTION")
        .map(|description| description.text())
        .unwrap_or_default();

    match (header.is_empty(), body.is_empty()) {
        (true, _) => body,
        (false, true) => header.join("\n"),
        (false, false) => format!("{}\n\n{body}", header.join("\n")),
    }
}
