use async_trait::async_trait;
use rocky_orm::DataContext;

use crate::database::naming::format_table_name;
use crate::database::order::{deletion_order, WipeOptions};
use crate::TestResult;

/// Table names of `context`'s model in deletion order, rendered for its backend
pub fn table_names_in_wipe_order<C>(context: &C, options: &WipeOptions) -> TestResult<Vec<String>>
where
    C: DataContext + ?Sized,
{
    let backend = context.backend();
    let order = deletion_order(context.model().tables(), options)?;
    Ok(order
        .into_iter()
        .map(|table| format_table_name(table, backend, options.add_brackets_and_schema))
        .collect())
}

/// Delete every row of every non-excluded table.
///
/// Statements run one at a time outside any transaction; the first storage
/// failure stops the wipe and is returned as is.
pub async fn wipe_all_data<C>(context: &C, options: &WipeOptions) -> TestResult<()>
where
    C: DataContext + ?Sized,
{
    let names = table_names_in_wipe_order(context, options)?;
    for name in &names {
        let sql = format!("DELETE FROM {}", name);
        let rows = context.execute_raw(&sql).await?;
        tracing::debug!(table = %name, rows, "Wiped table");
    }
    tracing::debug!("Wiped {} tables", names.len());
    Ok(())
}

/// Create the schema, or wipe it when it already exists.
///
/// Returns `true` when the schema was freshly created and `false` when existing
/// data was wiped.
pub async fn create_empty_via_wipe<C>(context: &C, options: &WipeOptions) -> TestResult<bool>
where
    C: DataContext + ?Sized,
{
    if context.ensure_created().await? {
        return Ok(true);
    }
    wipe_all_data(context, options).await?;
    Ok(false)
}

/// Wipe helpers available on every [`DataContext`]
#[async_trait]
pub trait DataContextExt: DataContext {
    async fn wipe_all_data(&self, options: &WipeOptions) -> TestResult<()> {
        wipe_all_data(self, options).await
    }

    async fn create_empty_via_wipe(&self, options: &WipeOptions) -> TestResult<bool> {
        create_empty_via_wipe(self, options).await
    }

    fn table_names_in_wipe_order(&self, options: &WipeOptions) -> TestResult<Vec<String>> {
        table_names_in_wipe_order(self, options)
    }
}

impl<C: DataContext + ?Sized> DataContextExt for C {}
