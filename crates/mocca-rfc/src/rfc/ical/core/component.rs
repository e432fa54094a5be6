//! iCalendar component tree (RFC 5545 §3.4, §3.6).

use super::ContentLine;

/// A `BEGIN:`/`END:` delimited component with its properties and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Component name (normalized to uppercase), e.g. `VEVENT`.
    pub name: String,
    pub properties: Vec<ContentLine>,
    pub children: Vec<Component>,
    /// Line of the `BEGIN` marker (1-based).
    pub line: usize,
}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: ContentLine) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&ContentLine> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns every property with the given name, in document order.
    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&ContentLine> {
        self.properties
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Returns the raw value of the first property with the given name.
    #[must_use]
    pub fn raw_value(&self, name: &str) -> Option<&str> {
        self.get_property(name).map(|p| p.raw_value.as_str())
    }

    /// Returns the direct children with the given component name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the `VEVENT` children of a `VCALENDAR`.
    pub fn events(&self) -> impl Iterator<Item = &Component> {
        self.children_named("VEVENT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_lookup_is_case_insensitive() {
        let event = Component::new("vevent")
            .with_property(ContentLine::new("summary", "Standup"))
            .with_property(ContentLine::new("ATTENDEE", "mailto:a@example.com"))
            .with_property(ContentLine::new("ATTENDEE", "mailto:b@example.com"));

        assert_eq!(event.name, "VEVENT");
        assert_eq!(event.raw_value("Summary"), Some("Standup"));
        assert_eq!(event.get_properties("attendee").len(), 2);
        assert!(event.get_property("LOCATION").is_none());
    }

    #[test]
    fn events_filters_children() {
        let calendar = Component::new("VCALENDAR")
            .with_child(Component::new("VTIMEZONE"))
            .with_child(Component::new("VEVENT"))
            .with_child(Component::new("VEVENT"));

        assert_eq!(calendar.events().count(), 2);
    }
}
