// Trace metadata model
// Parameters, provenance, traces, streams and events

pub mod event;
pub mod params;
pub mod provenance;
pub mod stream;
pub mod time;
pub mod trace;
pub mod value;

pub use event::ScalarEvent;
pub use params::{
    CornerFrequencies, CornerMethod, Failure, MethodParseError, Parameter, ParameterError,
    PickerType, SignalEnd, SignalEndMethod, SignalSplit, SplitMethod,
};
pub use provenance::{Provenance, ProvenanceRecord};
pub use stream::StationStream;
pub use time::{add_seconds, seconds_between};
pub use trace::{Coordinates, ProcessLevel, StandardMetadata, StationTrace, TraceError, TraceStats};
pub use value::ParamValue;
