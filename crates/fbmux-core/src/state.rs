/// Longest password the lock accepts; further input is dropped.
pub const PASSWORD_CAPACITY: usize = 1023;

/// Process-wide mode flags, written only by the control thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MuxState {
    pub current_tag: usize,
    /// The tag to return to with the "last tag" command.
    pub last_tag: usize,
    /// Set once; the loop stops at the next iteration.
    pub exiting: bool,
    /// The console was switched away: nothing may be drawn.
    pub display_suspended: bool,
    /// Tag switches are refused.
    pub tag_switch_locked: bool,
    pub locked: bool,
    pub password: Vec<u8>,
    /// Running a single command given on the command line.
    pub single_command_mode: bool,
}
