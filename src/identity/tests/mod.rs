mod common;

mod reconciler;
