// 🔁 Role Block Scanner - label line + continuation lines → raw entries
//
// A role block in the extract looks like:
//
//   Savininkas: Jonas Jonaitis, gim. 1980-01-01
//   Ona Jonaitienė, gim. 1982-03-04
//   <anything else ends the block>
//
// Modelled as a small state machine so the stopping rules (immediate
// mismatch, end of input mid-block, later label lines) are explicit.

use crate::entities::Role;
use once_cell::sync::Lazy;
use regex::Regex;

static CONTINUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.+,\s*(gim\.|a\.k\.)").expect("continuation pattern"));

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// No label line seen yet
    SeekingLabel,

    /// Label seen; collecting continuation lines
    Accumulating,

    /// Block closed; further lines are ignored
    Done,
}

// ============================================================================
// SCANNER
// ============================================================================

pub struct RoleBlockScanner {
    role: Role,
    label_start: Regex,
    label_any: Regex,
    state: BlockState,
    entries: Vec<String>,
}

impl RoleBlockScanner {
    pub fn new(role: Role) -> Self {
        let label = regex::escape(role.label());

        RoleBlockScanner {
            role,
            label_start: Regex::new(&format!(r"(?i)^{}:?\s*", label)).expect("escaped label"),
            label_any: Regex::new(&format!(r"(?i){}:?\s*", label)).expect("escaped label"),
            state: BlockState::SeekingLabel,
            entries: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Feed the next line of the document and return the resulting state
    pub fn feed(&mut self, line: &str) -> BlockState {
        let line = line.trim();

        match self.state {
            BlockState::SeekingLabel => {
                if self.label_start.is_match(line) {
                    let remainder = self.label_any.replace_all(line, "");
                    self.entries.push(remainder.trim().to_string());
                    self.state = BlockState::Accumulating;
                }
            }
            BlockState::Accumulating => {
                if CONTINUATION_RE.is_match(line) {
                    self.entries.push(line.to_string());
                } else {
                    self.state = BlockState::Done;
                }
            }
            BlockState::Done => {}
        }

        self.state
    }

    /// End of input; whatever was accumulated is the block
    pub fn finish(self) -> Vec<String> {
        self.entries
    }
}

/// Raw entries of the first `role` block in `lines`
pub fn scan_role_block<'a, I>(lines: I, role: Role) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scanner = RoleBlockScanner::new(role);

    for line in lines {
        if scanner.feed(line) == BlockState::Done {
            break;
        }
    }

    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_label_yields_nothing() {
        let text = "Registro Nr.: 44/1\nJonas Jonaitis, gim. 1980-01-01\n";
        assert!(scan_role_block(text.lines(), Role::Owner).is_empty());
    }

    #[test]
    fn test_single_line_block() {
        let text = "Savininkas: Jonas Jonaitis, gim. 1980-01-01\nKiti duomenys";
        assert_eq!(
            scan_role_block(text.lines(), Role::Owner),
            vec!["Jonas Jonaitis, gim. 1980-01-01".to_string()]
        );
    }

    #[test]
    fn test_continuation_lines_accumulate_until_mismatch() {
        let text = "\
Savininkas: Jonas Jonaitis, gim. 1980-01-01
Ona Jonaitienė, gim. 1982-03-04
UAB Miškas, a.k. 300000001
Įregistravimo pagrindas: sutartis
Petras Petraitis, gim. 1970-01-01";
        let entries = scan_role_block(text.lines(), Role::Owner);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2], "UAB Miškas, a.k. 300000001");
    }

    #[test]
    fn test_end_of_input_mid_block_keeps_entries() {
        let mut scanner = RoleBlockScanner::new(Role::Tenant);
        assert_eq!(scanner.feed("Nuomininkas: UAB Forestas, a.k. 123456789"), BlockState::Accumulating);
        assert_eq!(scanner.feed("Ona Onaitė, gim. 1950-02-02"), BlockState::Accumulating);
        let entries = scanner.finish();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_immediate_mismatch_closes_block() {
        let mut scanner = RoleBlockScanner::new(Role::Owner);
        scanner.feed("Savininkas: Jonas Jonaitis, gim. 1980-01-01");
        assert_eq!(scanner.feed(""), BlockState::Done);
        // Later lines, even label lines, are ignored once done
        assert_eq!(scanner.feed("Savininkas: Kitas Savininkas, gim. 1990-01-01"), BlockState::Done);
        assert_eq!(scanner.finish().len(), 1);
    }

    #[test]
    fn test_label_match_is_case_insensitive_and_colon_optional() {
        let text = "PATIKĖTINIS UAB Turtas, a.k. 111";
        assert_eq!(
            scan_role_block(text.lines(), Role::Trustee),
            vec!["UAB Turtas, a.k. 111".to_string()]
        );
    }

    #[test]
    fn test_label_must_lead_the_line() {
        let text = "Buvęs savininkas: Jonas Jonaitis, gim. 1980-01-01";
        assert!(scan_role_block(text.lines(), Role::Owner).is_empty());
    }

    #[test]
    fn test_label_line_with_empty_remainder() {
        let text = "Savininkas:\nJonas Jonaitis, gim. 1980-01-01";
        assert_eq!(
            scan_role_block(text.lines(), Role::Owner),
            vec![String::new(), "Jonas Jonaitis, gim. 1980-01-01".to_string()]
        );
    }
}
