pub mod batch;
pub mod convert;

/// Exit status used when a run aborts on I/O or serialization failure
pub const FATAL_EXIT_CODE: u8 = 3;

/// How a command finished, mapped onto the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one note written
    Success,
    /// No markdown files in the target directory
    NoMarkdownFiles,
    /// Markdown files found but none converted
    NothingConverted,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::NoMarkdownFiles => 1,
            Outcome::NothingConverted => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            Outcome::Success.code(),
            Outcome::NoMarkdownFiles.code(),
            Outcome::NothingConverted.code(),
            FATAL_EXIT_CODE,
        ];
        assert_eq!(codes, [0, 1, 2, 3]);
    }
}
