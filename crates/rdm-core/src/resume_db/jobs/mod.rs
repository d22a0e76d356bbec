//! Job CRUD on `ResumeDb`, split into read and write halves.

mod read;
mod write;
