// Library side of the `fourthdown` binary: the weekly run and its report,
// exposed so integration tests can drive a run without a terminal.

pub mod report;
pub mod run;
