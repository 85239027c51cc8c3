//! Shape configuration (TOML) and the validated plan built from it

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, ShapeError};
use crate::model::{Record, RecordSchema, ValueType};
use crate::ops::RecordResolver;
use crate::pagination::{PageRequest, PaginationConfig, DEFAULT_PAGE_SIZE};
use crate::projection::{CascaderSpec, FieldSpec, FileSpec, Projection, RecursiveSpec};
use crate::query::{Columns, QueryContext};

/// Request parameter names read by collection shaping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamNames {
    pub page_size: String,
    pub page_number: String,
    pub search_field: String,
    pub search_query: String,
    pub sort: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            page_size: "limit".to_string(),
            page_number: "page".to_string(),
            search_field: "search_field".to_string(),
            search_query: "search".to_string(),
            sort: "sort".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_page_size: usize,
    pub max_page_size: Option<usize>,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: None,
        }
    }
}

/// Config entry given either as a bare name or as a full table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameOr<T> {
    Name(String),
    Full(T),
}

impl<T> NameOr<T> {
    fn into_spec(self, from_name: impl FnOnce(String) -> T) -> T {
        match self {
            NameOr::Name(name) => from_name(name),
            NameOr::Full(spec) => spec,
        }
    }
}

/// Declared path field; a bare name is a dotted path named with `_`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpecConfig {
    pub name: String,
    pub source: String,
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
}

/// Serialized shaping configuration
///
/// ```toml
/// entity = "category"
/// exclude = ["internal_note"]
/// field_specs = ["parent.label", { name = "root_id", source = "parent.parent.id" }]
/// cascaders = ["parent"]
/// search = true
///
/// [pagination]
/// default_page_size = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub entity: String,
    /// Allow-list; every field when unset
    pub fields: Option<Vec<String>>,
    pub exclude: Vec<String>,
    pub nest: bool,
    pub field_specs: Vec<NameOr<FieldSpecConfig>>,
    pub cascaders: Vec<NameOr<CascaderSpec>>,
    pub recursive: Vec<NameOr<RecursiveSpec>>,
    pub file_fields: Vec<NameOr<FileSpec>>,
    pub search: bool,
    pub sort: bool,
    pub pagination: PaginationSettings,
    pub params: ParamNames,
}

impl ShapeConfig {
    /// # Errors
    ///
    /// Returns `Serialization` on malformed TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Request query parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parse a `key=value` pair
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when there is no `=` or the key is empty.
    pub fn parse_pair(raw: &str) -> Result<(String, String)> {
        match raw.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
            _ => Err(ShapeError::configuration(
                "param",
                format!("expected key=value, got `{}`", raw),
            )),
        }
    }
}

/// Validated, immutable shaping configuration for one entity
#[derive(Debug, Clone)]
pub struct ShapePlan {
    schema: RecordSchema,
    projection: Projection,
    columns: Columns,
    nest: bool,
    cascaders: Vec<CascaderSpec>,
    recursive: Vec<RecursiveSpec>,
    files: Vec<FileSpec>,
    search: bool,
    sort: bool,
    pagination: PaginationSettings,
    params: ParamNames,
    hooks: PaginationConfig,
}

impl ShapePlan {
    pub fn builder<'r>(
        resolver: &'r dyn RecordResolver,
        entity: impl Into<String>,
    ) -> ShapePlanBuilder<'r> {
        ShapePlanBuilder::new(resolver, entity)
    }

    /// Validate a serialized configuration against the resolver's schemas
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for invalid entries and `UnknownEntity` if the
    /// entity has no schema.
    pub fn from_config(resolver: &dyn RecordResolver, config: &ShapeConfig) -> Result<Self> {
        if config.entity.trim().is_empty() {
            return Err(ShapeError::configuration("entity", "entity must be set"));
        }

        let mut builder = ShapePlan::builder(resolver, config.entity.clone())
            .exclude(config.exclude.clone())
            .nest(config.nest)
            .searchable(config.search)
            .sortable(config.sort)
            .pagination(config.pagination.clone())
            .params(config.params.clone());
        if let Some(allow) = &config.fields {
            builder = builder.fields(allow.clone());
        }
        for entry in config.field_specs.iter().cloned() {
            let spec = match entry {
                NameOr::Name(path) => FieldSpec::dotted(path),
                NameOr::Full(c) => {
                    let spec = FieldSpec::path(c.name, c.source);
                    match c.value_type {
                        Some(t) => spec.with_type(t),
                        None => spec,
                    }
                }
            };
            builder = builder.field_spec(spec);
        }
        for entry in config.cascaders.iter().cloned() {
            builder = builder.cascader(entry.into_spec(CascaderSpec::new));
        }
        for entry in config.recursive.iter().cloned() {
            builder = builder.recursive(entry.into_spec(|name| RecursiveSpec::new(name, 0)));
        }
        for entry in config.file_fields.iter().cloned() {
            builder = builder.file_field(entry.into_spec(FileSpec::new));
        }
        builder.build()
    }

    /// Same plan narrowed to an ad-hoc allow-list
    pub fn restricted(&self, fields: &[String]) -> ShapePlan {
        let projection = self.projection.restrict(fields);
        let columns = Columns::compute(&projection, &self.schema);
        ShapePlan {
            projection,
            columns,
            ..self.clone()
        }
    }

    pub fn query_context(&self) -> QueryContext<'_> {
        QueryContext {
            schema: &self.schema,
            projection: &self.projection,
            recursive: &self.recursive,
            columns: &self.columns,
        }
    }

    /// Page size and number read from the request, with configured defaults
    pub fn page_request(&self, params: &QueryParams) -> PageRequest {
        PageRequest::from_params(
            params.get(&self.params.page_size),
            params.get(&self.params.page_number),
            self.pagination.default_page_size,
            self.pagination.max_page_size,
        )
    }

    pub fn entity(&self) -> &str {
        &self.schema.entity
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn nest(&self) -> bool {
        self.nest
    }

    pub fn cascaders(&self) -> &[CascaderSpec] {
        &self.cascaders
    }

    pub fn recursive(&self) -> &[RecursiveSpec] {
        &self.recursive
    }

    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }

    pub fn search_enabled(&self) -> bool {
        self.search
    }

    pub fn sort_enabled(&self) -> bool {
        self.sort
    }

    pub fn params(&self) -> &ParamNames {
        &self.params
    }

    pub fn hooks(&self) -> &PaginationConfig {
        &self.hooks
    }
}

/// Builder for [`ShapePlan`]; `build` validates everything once
pub struct ShapePlanBuilder<'r> {
    resolver: &'r dyn RecordResolver,
    entity: String,
    specs: Vec<FieldSpec>,
    allow: Option<Vec<String>>,
    deny: Vec<String>,
    nest: bool,
    cascaders: Vec<CascaderSpec>,
    recursive: Vec<RecursiveSpec>,
    files: Vec<FileSpec>,
    search: bool,
    sort: bool,
    pagination: PaginationSettings,
    params: ParamNames,
    hooks: PaginationConfig,
}

impl<'r> ShapePlanBuilder<'r> {
    fn new(resolver: &'r dyn RecordResolver, entity: impl Into<String>) -> Self {
        Self {
            resolver,
            entity: entity.into(),
            specs: Vec::new(),
            allow: None,
            deny: Vec::new(),
            nest: false,
            cascaders: Vec::new(),
            recursive: Vec::new(),
            files: Vec::new(),
            search: false,
            sort: false,
            pagination: PaginationSettings::default(),
            params: ParamNames::default(),
            hooks: PaginationConfig::default(),
        }
    }

    pub fn field_spec(mut self, spec: FieldSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn fields(mut self, allow: Vec<String>) -> Self {
        self.allow = Some(allow);
        self
    }

    pub fn exclude(mut self, deny: Vec<String>) -> Self {
        self.deny = deny;
        self
    }

    pub fn nest(mut self, nest: bool) -> Self {
        self.nest = nest;
        self
    }

    pub fn cascader(mut self, spec: CascaderSpec) -> Self {
        self.cascaders.push(spec);
        self
    }

    pub fn recursive(mut self, spec: RecursiveSpec) -> Self {
        self.recursive.push(spec);
        self
    }

    pub fn file_field(mut self, spec: FileSpec) -> Self {
        self.files.push(spec);
        self
    }

    pub fn searchable(mut self, enabled: bool) -> Self {
        self.search = enabled;
        self
    }

    pub fn sortable(mut self, enabled: bool) -> Self {
        self.sort = enabled;
        self
    }

    pub fn pagination(mut self, settings: PaginationSettings) -> Self {
        self.pagination = settings;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.pagination.default_page_size = size;
        self
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.pagination.max_page_size = Some(size);
        self
    }

    pub fn params(mut self, params: ParamNames) -> Self {
        self.params = params;
        self
    }

    pub fn before_page<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[&Record]) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_before(hook);
        self
    }

    pub fn after_page<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[&Record]) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_after(hook);
        self
    }

    /// # Errors
    ///
    /// Returns `UnknownEntity` or `Configuration` naming the offending key.
    pub fn build(self) -> Result<ShapePlan> {
        let schema = self
            .resolver
            .schema(&self.entity)
            .ok_or_else(|| ShapeError::UnknownEntity {
                entity: self.entity.clone(),
            })?
            .clone();

        let projection = Projection::build(
            self.resolver,
            &schema,
            &self.specs,
            self.allow.as_deref(),
            &self.deny,
        )?;

        let mut decorated = BTreeSet::new();
        let decorations = self
            .cascaders
            .iter()
            .map(|c| ("cascaders", c.name.as_str(), c.field.as_deref()))
            .chain(
                self.recursive
                    .iter()
                    .map(|r| ("recursive", r.name.as_str(), r.field.as_deref())),
            )
            .chain(
                self.files
                    .iter()
                    .map(|f| ("file_fields", f.name.as_str(), f.field.as_deref())),
            );
        for (section, name, field) in decorations {
            if name.trim().is_empty() {
                return Err(ShapeError::configuration(section, "name must not be empty"));
            }
            if field.is_some_and(|f| f.trim().is_empty()) {
                return Err(ShapeError::configuration(
                    name,
                    "collect field must not be empty",
                ));
            }
            if !decorated.insert(name) {
                return Err(ShapeError::configuration(
                    name,
                    "field is decorated more than once",
                ));
            }
        }
        if let Some(spec) = self.files.iter().find(|f| f.url_field.trim().is_empty()) {
            return Err(ShapeError::configuration(
                spec.name.clone(),
                "url field must not be empty",
            ));
        }

        if self.pagination.default_page_size == 0 {
            return Err(ShapeError::configuration(
                "pagination.default_page_size",
                "page size must be positive",
            ));
        }
        if self.pagination.max_page_size == Some(0) {
            return Err(ShapeError::configuration(
                "pagination.max_page_size",
                "page size must be positive",
            ));
        }

        let param_names = [
            ("params.page_size", &self.params.page_size),
            ("params.page_number", &self.params.page_number),
            ("params.search_field", &self.params.search_field),
            ("params.search_query", &self.params.search_query),
            ("params.sort", &self.params.sort),
        ];
        if let Some((key, _)) = param_names.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ShapeError::configuration(
                *key,
                "parameter name must not be empty",
            ));
        }

        let columns = Columns::compute(&projection, &schema);
        Ok(ShapePlan {
            schema,
            projection,
            columns,
            nest: self.nest,
            cascaders: self.cascaders,
            recursive: self.recursive,
            files: self.files,
            search: self.search,
            sort: self.sort,
            pagination: self.pagination,
            params: self.params,
            hooks: self.hooks,
        })
    }
}
