mod format;
mod supertypes;
