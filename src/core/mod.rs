//! Core functionality: conversion, heading identifiers, scroll tracking,
//! documents, configuration and export

pub mod config;
pub mod convert;
pub mod document;
pub mod export;
pub mod samples;
pub mod scroll_spy;
pub mod slug;
pub mod watcher;
