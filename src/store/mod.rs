pub mod archives;
pub mod hashes;
pub mod paths;
pub mod temps;
