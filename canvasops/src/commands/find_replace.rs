use anyhow::{Context, Result};
use std::path::PathBuf;

use canvasops::config::{load_mappings_file, Config};
use canvasops::core::output::{OutputFormat, OutputWriter};
use canvasops::replace::Report;
use canvasops::{
    ContentType, CourseFilter, ExecutionMode, ScanRequest, Scanner, Scope, UrlMapping,
};

pub struct FindReplaceOptions {
    pub course: Option<String>,
    pub courses: Option<Vec<String>>,
    pub subaccount: Option<String>,
    pub term: Option<String>,
    pub states: Vec<String>,
    pub types: Vec<String>,
    pub maps: Vec<String>,
    pub mappings_file: Option<PathBuf>,
    pub live: bool,
    pub output: Option<PathBuf>,
}

impl FindReplaceOptions {
    fn scope(&self) -> Result<Scope> {
        if self.subaccount.is_none() && (self.term.is_some() || !self.states.is_empty()) {
            anyhow::bail!("--term and --state only apply with --subaccount");
        }

        Ok(if let Some(subaccount_id) = &self.subaccount {
            Scope::Subaccount {
                subaccount_id: subaccount_id.clone(),
                filter: CourseFilter {
                    term_id: self.term.clone(),
                    workflow_states: self.states.clone(),
                },
            }
        } else if let Some(ids) = &self.courses {
            Scope::CourseList(ids.clone())
        } else {
            Scope::SingleCourse(self.course.clone().unwrap_or_default())
        })
    }

    fn content_types(&self) -> Result<Vec<ContentType>> {
        self.types
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.parse::<ContentType>().map_err(anyhow::Error::from))
            .collect()
    }

    /// File mappings first, then `--map` pairs, preserving order
    fn mappings(&self) -> Result<Vec<UrlMapping>> {
        let mut mappings = match &self.mappings_file {
            Some(path) => load_mappings_file(path)?,
            None => Vec::new(),
        };
        for raw in &self.maps {
            mappings.push(raw.parse::<UrlMapping>()?);
        }
        Ok(mappings)
    }
}

pub async fn run(options: FindReplaceOptions, config: &Config, format: OutputFormat) -> Result<()> {
    let request = ScanRequest {
        scope: options.scope()?,
        content_types: options.content_types()?,
        mappings: options.mappings()?,
        mode: if options.live {
            ExecutionMode::Live
        } else {
            ExecutionMode::Preview
        },
    };

    for mapping in &request.mappings {
        tracing::info!("Mapping: {} → {}", mapping.old_value, mapping.new_value);
    }

    let client = super::client(config)?;
    let outcome = Scanner::new(&client)
        .with_progress(format != OutputFormat::Json)
        .run(&request)
        .await
        .context("Find & replace run failed")?;

    let report = Report::from_outcome(&outcome);
    let writer = OutputWriter::new(format);
    writer.write_report(&report)?;

    if let Some(path) = &options.output {
        writer.export_report(&report, path)?;
        tracing::info!("Report written to {}", path.display());
    }

    if request.mode == ExecutionMode::Preview && format != OutputFormat::Json && !report.rows.is_empty() {
        println!("💡 Run with --live to apply changes");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FindReplaceOptions {
        FindReplaceOptions {
            course: None,
            courses: None,
            subaccount: None,
            term: None,
            states: Vec::new(),
            types: vec!["pages".to_string()],
            maps: vec!["a=b".to_string()],
            mappings_file: None,
            live: false,
            output: None,
        }
    }

    #[test]
    fn test_filter_without_subaccount_is_rejected() {
        let mut opts = options();
        opts.course = Some("1".to_string());
        opts.term = Some("5".to_string());
        let err = opts.scope().unwrap_err();
        assert!(err.to_string().contains("--subaccount"));

        let mut opts = options();
        opts.courses = Some(vec!["1".to_string(), "2".to_string()]);
        opts.states = vec!["available".to_string()];
        assert!(opts.scope().is_err());
    }

    #[test]
    fn test_subaccount_scope_carries_filter() {
        let mut opts = options();
        opts.subaccount = Some("12".to_string());
        opts.term = Some("5".to_string());
        opts.states = vec!["completed".to_string()];

        match opts.scope().unwrap() {
            Scope::Subaccount { subaccount_id, filter } => {
                assert_eq!(subaccount_id, "12");
                assert_eq!(filter.term_id.as_deref(), Some("5"));
                assert_eq!(filter.workflow_states, vec!["completed"]);
            }
            other => panic!("unexpected scope {:?}", other),
        }
    }
}
