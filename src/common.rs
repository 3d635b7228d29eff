pub use itertools::Itertools;
pub use log::{debug, error, info, warn};
pub use serde::Serialize;
pub use serde_json::{Map, Value};
pub use std::{
    fmt::Display,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};
