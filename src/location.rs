use std::{
    fmt::{Display, Formatter},
    panic::Location,
};

/// Where a provider, consumer or module was declared. Builders capture the
/// location of their caller automatically, and the location can be replaced
/// explicitly with the builder's `location` method.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
    column: u32,
}

impl SourceLocation {
    #[must_use]
    pub const fn new(file: &'static str, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }

    /// Captures the location of the caller. Functions calling this should be
    /// annotated with `#[track_caller]` so the location of their own caller
    /// is reported instead.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        SourceLocation::from(Location::caller())
    }

    #[must_use]
    pub fn file(&self) -> &'static str {
        self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// The directory of the source file. Validation errors are grouped by
    /// this value.
    #[must_use]
    pub fn directory(&self) -> &'static str {
        match self.file.rfind(['/', '\\']) {
            Some(index) => &self.file[..index],
            None => ".",
        }
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        SourceLocation {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::SourceLocation;

    #[track_caller]
    fn captured() -> SourceLocation {
        SourceLocation::caller()
    }

    #[test]
    fn caller_location_is_tracked() {
        let expected_line = line!() + 1;
        let location = captured();
        assert_eq!(expected_line, location.line());
        assert!(location.file().ends_with("location.rs"));
    }

    #[test]
    fn directories_are_split_from_files() {
        assert_eq!("src/model", SourceLocation::new("src/model/a.rs", 1, 1).directory());
        assert_eq!("C:\\src", SourceLocation::new("C:\\src\\a.rs", 1, 1).directory());
        assert_eq!(".", SourceLocation::new("a.rs", 1, 1).directory());
        assert_eq!("src/a.rs:3:7", SourceLocation::new("src/a.rs", 3, 7).to_string());
    }
}
