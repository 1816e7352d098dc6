// スキーマ構築サービス
//
// シートのカラムごとに名前をサニタイズし、型を推論してテーブルスキーマを組み立てます。
// オーバーライドのキーはサニタイズ後の名前と照合されるため、推論より前に名前を確定させます。

use crate::core::naming::{NameKind, NameRegistry};
use crate::core::schema::{ColumnDefinition, ColumnTypeOverrides, TableSchema};
use crate::core::sheet::SheetColumn;
use crate::services::type_inferencer::TypeInferencer;
use tracing::debug;

/// スキーマ構築サービス
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    inferencer: TypeInferencer,
}

impl SchemaBuilder {
    /// 新しいSchemaBuilderを作成
    pub fn new() -> Self {
        Self {
            inferencer: TypeInferencer::new(),
        }
    }

    /// テーブルスキーマを構築
    ///
    /// # Arguments
    ///
    /// * `table_name` - サニタイズ済みテーブル名
    /// * `columns` - ソース順のカラム
    /// * `overrides` - カラム型オーバーライド
    ///
    /// # Returns
    ///
    /// カラム順を保持し、カラム名が重複しないテーブルスキーマ
    pub fn build(
        &self,
        table_name: &str,
        columns: &[SheetColumn],
        overrides: &ColumnTypeOverrides,
    ) -> TableSchema {
        let mut schema = TableSchema::new(table_name);
        let mut names = NameRegistry::new();

        for column in columns {
            let name = names.claim(&column.label, NameKind::Column);
            let (storage_type, origin) =
                self.inferencer
                    .infer(table_name, &name, &column.values, overrides);

            debug!(
                table = table_name,
                column = %name,
                label = %column.label,
                storage_type = %storage_type,
                origin = ?origin,
                "Resolved column type"
            );

            schema.add_column(ColumnDefinition {
                name,
                source_label: column.label.clone(),
                storage_type,
                origin,
            });
        }

        schema
    }
}
