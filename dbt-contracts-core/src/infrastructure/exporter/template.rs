// dbt-contracts-core/src/infrastructure/exporter/template.rs

// Renders the staging model body. The output is itself a dbt Jinja template,
// so the `{{`/`}}` delimiters of the emitted `source()` call are passed in as
// plain values instead of being written in the template.

use crate::infrastructure::error::InfrastructureError;
use minijinja::{Environment, context};

const STAGING_TEMPLATE_NAME: &str = "staging.sql";
const STAGING_TEMPLATE: &str = "select
{%- for column in columns %}
    {{ column }}{% if not loop.last %},{% endif %}
{%- endfor %}
from {{ open }} source('{{ source }}', '{{ table }}') {{ close }}
";

pub struct SqlTemplate<'a> {
    env: Environment<'a>,
}

impl<'a> SqlTemplate<'a> {
    pub fn new() -> Result<Self, InfrastructureError> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template(STAGING_TEMPLATE_NAME, STAGING_TEMPLATE)?;
        Ok(Self { env })
    }

    /// `select <columns> from {{ source('<source>', '<table>') }}`
    pub fn render_staging(
        &self,
        source: &str,
        table: &str,
        columns: &[&str],
    ) -> Result<String, InfrastructureError> {
        let columns: Vec<&str> = if columns.is_empty() {
            vec!["*"]
        } else {
            columns.to_vec()
        };

        let tmpl = self.env.get_template(STAGING_TEMPLATE_NAME)?;
        let sql = tmpl.render(context! {
            columns => columns,
            source => source,
            table => table,
            open => "{{",
            close => "}}",
        })?;
        Ok(sql)
    }
}
