//! Item-to-column mapping: declare once, project any item collection into
//! named typed columns, and apply columnar edits back onto the items.
//!
//! A [`DataframeMapperBuilder`] registers typed extractor/setter closures at
//! build time; the resulting [`DataframeMapper`] is immutable and reusable.
//! The read path (`create_dataframe`) is side-effect-free and safe to call
//! concurrently; the write path (`update_series`) mutates externally owned
//! items and must be serialized by the caller.

use crate::filter::AttributeFilter;
use crate::series::{Series, SeriesDataType, SeriesMetadata, SeriesValues};
use crate::update::UpdatingDataframe;
use gex_core::{GexError, GexResult};

type ItemsProvider<C, T> = Box<dyn for<'a> Fn(&'a C) -> Vec<&'a T> + Send + Sync>;
type ItemGetter<C, T> = Box<dyn for<'a> Fn(&'a mut C, &str) -> Option<&'a mut T> + Send + Sync>;
type MultiIndexGetter<C, T> =
    Box<dyn for<'a> Fn(&'a mut C, &UpdatingDataframe, usize) -> Option<&'a mut T> + Send + Sync>;

pub type StringSetter<T> = Box<dyn Fn(&mut T, &str) + Send + Sync>;
pub type DoubleSetter<T> = Box<dyn Fn(&mut T, f64) + Send + Sync>;
pub type IntSetter<T> = Box<dyn Fn(&mut T, i32) + Send + Sync>;
pub type BooleanSetter<T> = Box<dyn Fn(&mut T, bool) + Send + Sync>;

/// Typed accessor pair for one column. The getter runs on the read path;
/// the setter, when present, on the update path.
enum Extractor<T> {
    Strings {
        getter: Box<dyn Fn(&T) -> String + Send + Sync>,
        setter: Option<StringSetter<T>>,
    },
    Doubles {
        getter: Box<dyn Fn(&T) -> f64 + Send + Sync>,
        setter: Option<DoubleSetter<T>>,
    },
    Ints {
        getter: Box<dyn Fn(&T) -> i32 + Send + Sync>,
        setter: Option<IntSetter<T>>,
    },
    Booleans {
        getter: Box<dyn Fn(&T) -> bool + Send + Sync>,
        setter: Option<BooleanSetter<T>>,
    },
    /// Getter yields a 0-based ordinal over the declared enumeration.
    Enums {
        getter: Box<dyn Fn(&T) -> i32 + Send + Sync>,
        setter: Option<IntSetter<T>>,
    },
}

impl<T> Extractor<T> {
    fn data_type(&self) -> SeriesDataType {
        match self {
            Extractor::Strings { .. } => SeriesDataType::String,
            Extractor::Doubles { .. } => SeriesDataType::Double,
            Extractor::Ints { .. } => SeriesDataType::Int,
            Extractor::Booleans { .. } => SeriesDataType::Boolean,
            Extractor::Enums { .. } => SeriesDataType::Enum,
        }
    }

    fn has_setter(&self) -> bool {
        match self {
            Extractor::Strings { setter, .. } => setter.is_some(),
            Extractor::Doubles { setter, .. } => setter.is_some(),
            Extractor::Ints { setter, .. } => setter.is_some(),
            Extractor::Booleans { setter, .. } => setter.is_some(),
            Extractor::Enums { setter, .. } => setter.is_some(),
        }
    }

    /// Apply the cell at `row` of `series` to `item` through the setter.
    /// Setter presence is checked by the caller before any row is touched.
    fn apply(&self, name: &str, item: &mut T, series: &Series, row: usize) -> GexResult<()> {
        let type_mismatch = || {
            GexError::Validation(format!(
                "Column '{name}' has incompatible type {:?}",
                series.metadata().data_type()
            ))
        };
        match self {
            Extractor::Strings { setter: Some(set), .. } => {
                set(item, series.string_value(row).ok_or_else(type_mismatch)?);
            }
            Extractor::Doubles { setter: Some(set), .. } => {
                set(item, series.double_value(row).ok_or_else(type_mismatch)?);
            }
            Extractor::Ints { setter: Some(set), .. } | Extractor::Enums { setter: Some(set), .. } => {
                set(item, series.int_value(row).ok_or_else(type_mismatch)?);
            }
            Extractor::Booleans { setter: Some(set), .. } => {
                set(item, series.boolean_value(row).ok_or_else(type_mismatch)?);
            }
            _ => return Err(GexError::MissingSetter(name.to_string())),
        }
        Ok(())
    }
}

struct Column<T> {
    metadata: SeriesMetadata,
    extractor: Extractor<T>,
}

/// A named bundle of columns backed by an optional per-item capability.
///
/// The bundle is emitted, grouped and after all static columns, only when at
/// least one item in the batch carries the capability.
struct CapabilityBundle<T> {
    #[allow(dead_code)]
    name: String,
    present: Box<dyn Fn(&T) -> bool + Send + Sync>,
    columns: Vec<Column<T>>,
}

/// Column group under construction for one capability.
pub struct CapabilityColumns<T> {
    columns: Vec<Column<T>>,
}

impl<T> CapabilityColumns<T> {
    fn new() -> Self {
        Self { columns: Vec::new() }
    }

    fn push(mut self, name: &str, extractor: Extractor<T>) -> Self {
        let metadata = SeriesMetadata::new(name, extractor.data_type(), false, false);
        self.columns.push(Column { metadata, extractor });
        self
    }

    pub fn strings(self, name: &str, getter: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.push(name, Extractor::Strings { getter: Box::new(getter), setter: None })
    }

    pub fn doubles(self, name: &str, getter: impl Fn(&T) -> f64 + Send + Sync + 'static) -> Self {
        self.push(name, Extractor::Doubles { getter: Box::new(getter), setter: None })
    }

    pub fn ints(self, name: &str, getter: impl Fn(&T) -> i32 + Send + Sync + 'static) -> Self {
        self.push(name, Extractor::Ints { getter: Box::new(getter), setter: None })
    }

    pub fn booleans(self, name: &str, getter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.push(name, Extractor::Booleans { getter: Box::new(getter), setter: None })
    }
}

/// Declares how to project an item type into named typed columns.
///
/// Single-use: `build()` consumes the builder and performs all structural
/// validation (duplicate names, index column count).
pub struct DataframeMapperBuilder<C, T> {
    items_provider: ItemsProvider<C, T>,
    item_getter: Option<ItemGetter<C, T>>,
    multi_index_getter: Option<MultiIndexGetter<C, T>>,
    columns: Vec<Column<T>>,
    bundles: Vec<CapabilityBundle<T>>,
}

impl<C, T> DataframeMapperBuilder<C, T> {
    /// Start a builder from the closure that lists a container's items.
    pub fn new(
        items_provider: impl for<'a> Fn(&'a C) -> Vec<&'a T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            items_provider: Box::new(items_provider),
            item_getter: None,
            multi_index_getter: None,
            columns: Vec::new(),
            bundles: Vec::new(),
        }
    }

    /// Closure resolving an item by its single string index key. Required
    /// before `update_series` on a mono-indexed table.
    pub fn item_getter(
        mut self,
        getter: impl for<'a> Fn(&'a mut C, &str) -> Option<&'a mut T> + Send + Sync + 'static,
    ) -> Self {
        self.item_getter = Some(Box::new(getter));
        self
    }

    /// Closure resolving an item by matching both index columns of the given
    /// row. Required before `update_series` on a compound-indexed table.
    pub fn item_multi_index_getter(
        mut self,
        getter: impl for<'a> Fn(&'a mut C, &UpdatingDataframe, usize) -> Option<&'a mut T>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.multi_index_getter = Some(Box::new(getter));
        self
    }

    fn add(mut self, name: &str, index: bool, default_attribute: bool, extractor: Extractor<T>) -> Self {
        let metadata = SeriesMetadata::new(name, extractor.data_type(), index, default_attribute);
        self.columns.push(Column { metadata, extractor });
        self
    }

    pub fn strings_index(self, name: &str, getter: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.add(name, true, true, Extractor::Strings { getter: Box::new(getter), setter: None })
    }

    pub fn ints_index(self, name: &str, getter: impl Fn(&T) -> i32 + Send + Sync + 'static) -> Self {
        self.add(name, true, true, Extractor::Ints { getter: Box::new(getter), setter: None })
    }

    pub fn strings(self, name: &str, getter: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.strings_with(name, getter, None, true)
    }

    pub fn strings_with(
        self,
        name: &str,
        getter: impl Fn(&T) -> String + Send + Sync + 'static,
        setter: Option<StringSetter<T>>,
        default_attribute: bool,
    ) -> Self {
        self.add(name, false, default_attribute, Extractor::Strings { getter: Box::new(getter), setter })
    }

    pub fn doubles(self, name: &str, getter: impl Fn(&T) -> f64 + Send + Sync + 'static) -> Self {
        self.doubles_with(name, getter, None, true)
    }

    pub fn doubles_with(
        self,
        name: &str,
        getter: impl Fn(&T) -> f64 + Send + Sync + 'static,
        setter: Option<DoubleSetter<T>>,
        default_attribute: bool,
    ) -> Self {
        self.add(name, false, default_attribute, Extractor::Doubles { getter: Box::new(getter), setter })
    }

    pub fn ints(self, name: &str, getter: impl Fn(&T) -> i32 + Send + Sync + 'static) -> Self {
        self.ints_with(name, getter, None, true)
    }

    pub fn ints_with(
        self,
        name: &str,
        getter: impl Fn(&T) -> i32 + Send + Sync + 'static,
        setter: Option<IntSetter<T>>,
        default_attribute: bool,
    ) -> Self {
        self.add(name, false, default_attribute, Extractor::Ints { getter: Box::new(getter), setter })
    }

    pub fn booleans(self, name: &str, getter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.booleans_with(name, getter, None, true)
    }

    pub fn booleans_with(
        self,
        name: &str,
        getter: impl Fn(&T) -> bool + Send + Sync + 'static,
        setter: Option<BooleanSetter<T>>,
        default_attribute: bool,
    ) -> Self {
        self.add(name, false, default_attribute, Extractor::Booleans { getter: Box::new(getter), setter })
    }

    /// Enum-ordinal column: the getter yields a 0-based ordinal, the setter
    /// (if any) receives one back.
    pub fn enums(self, name: &str, getter: impl Fn(&T) -> i32 + Send + Sync + 'static) -> Self {
        self.enums_with(name, getter, None, true)
    }

    pub fn enums_with(
        self,
        name: &str,
        getter: impl Fn(&T) -> i32 + Send + Sync + 'static,
        setter: Option<IntSetter<T>>,
        default_attribute: bool,
    ) -> Self {
        self.add(name, false, default_attribute, Extractor::Enums { getter: Box::new(getter), setter })
    }

    /// Register a capability bundle: a presence probe plus a column group,
    /// appended after all static columns when at least one item has the
    /// capability.
    pub fn capability(
        mut self,
        name: &str,
        present: impl Fn(&T) -> bool + Send + Sync + 'static,
        configure: impl FnOnce(CapabilityColumns<T>) -> CapabilityColumns<T>,
    ) -> Self {
        let group = configure(CapabilityColumns::new());
        self.bundles.push(CapabilityBundle {
            name: name.to_string(),
            present: Box::new(present),
            columns: group.columns,
        });
        self
    }

    /// Validate the declaration and produce the immutable mapper.
    pub fn build(self) -> GexResult<DataframeMapper<C, T>> {
        let mut seen = std::collections::HashSet::new();
        let all_columns = self
            .columns
            .iter()
            .chain(self.bundles.iter().flat_map(|b| b.columns.iter()));
        for column in all_columns {
            if !seen.insert(column.metadata.name().to_string()) {
                return Err(GexError::Validation(format!(
                    "Duplicate column '{}'",
                    column.metadata.name()
                )));
            }
        }
        let index_count = self.columns.iter().filter(|c| c.metadata.is_index()).count();
        if index_count > 2 {
            return Err(GexError::Validation(format!(
                "At most two index columns are supported, got {index_count}"
            )));
        }
        Ok(DataframeMapper {
            items_provider: self.items_provider,
            item_getter: self.item_getter,
            multi_index_getter: self.multi_index_getter,
            columns: self.columns,
            bundles: self.bundles,
        })
    }
}

/// Per-column fill buffer for one `create_dataframe` invocation.
enum ColumnBuffer {
    Strings(Vec<String>),
    Doubles(Vec<f64>),
    Ints(Vec<i32>),
    Booleans(Vec<bool>),
}

impl ColumnBuffer {
    fn with_capacity<T>(column: &Column<T>, capacity: usize) -> Self {
        match column.extractor {
            Extractor::Strings { .. } => ColumnBuffer::Strings(Vec::with_capacity(capacity)),
            Extractor::Doubles { .. } => ColumnBuffer::Doubles(Vec::with_capacity(capacity)),
            Extractor::Ints { .. } | Extractor::Enums { .. } => {
                ColumnBuffer::Ints(Vec::with_capacity(capacity))
            }
            Extractor::Booleans { .. } => ColumnBuffer::Booleans(Vec::with_capacity(capacity)),
        }
    }

    fn fill<T>(&mut self, column: &Column<T>, item: &T) {
        match (self, &column.extractor) {
            (ColumnBuffer::Strings(buf), Extractor::Strings { getter, .. }) => buf.push(getter(item)),
            (ColumnBuffer::Doubles(buf), Extractor::Doubles { getter, .. }) => buf.push(getter(item)),
            (ColumnBuffer::Ints(buf), Extractor::Ints { getter, .. })
            | (ColumnBuffer::Ints(buf), Extractor::Enums { getter, .. }) => buf.push(getter(item)),
            (ColumnBuffer::Booleans(buf), Extractor::Booleans { getter, .. }) => buf.push(getter(item)),
            // Buffers are created from the same column list they are filled from.
            _ => unreachable!("column buffer type mismatch"),
        }
    }

    fn into_values(self) -> SeriesValues {
        match self {
            ColumnBuffer::Strings(v) => SeriesValues::Strings(v),
            ColumnBuffer::Doubles(v) => SeriesValues::Doubles(v),
            ColumnBuffer::Ints(v) => SeriesValues::Ints(v),
            ColumnBuffer::Booleans(v) => SeriesValues::Booleans(v),
        }
    }
}

/// Immutable projection of an item type into named typed columns.
///
/// Safe to share across threads for reads; `update_series` mutates shared
/// domain state and is not safe for concurrent invocation on the same
/// container.
pub struct DataframeMapper<C, T> {
    items_provider: ItemsProvider<C, T>,
    item_getter: Option<ItemGetter<C, T>>,
    multi_index_getter: Option<MultiIndexGetter<C, T>>,
    columns: Vec<Column<T>>,
    bundles: Vec<CapabilityBundle<T>>,
}

impl<C, T> DataframeMapper<C, T> {
    /// Project the container's items into series, invoking `handler` once
    /// per surviving column in registration order: static columns first,
    /// then each present capability bundle as a contiguous group.
    pub fn create_dataframe<F: FnMut(Series)>(
        &self,
        container: &C,
        handler: &mut F,
        filter: &AttributeFilter,
    ) {
        let items = (self.items_provider)(container);

        let mut surviving: Vec<&Column<T>> = self
            .columns
            .iter()
            .filter(|c| filter.keeps(&c.metadata))
            .collect();
        for bundle in &self.bundles {
            if items.iter().any(|item| (bundle.present)(item)) {
                surviving.extend(bundle.columns.iter().filter(|c| filter.keeps(&c.metadata)));
            }
        }

        let mut buffers: Vec<ColumnBuffer> = surviving
            .iter()
            .map(|c| ColumnBuffer::with_capacity(c, items.len()))
            .collect();
        // One pass over the items fills every surviving column.
        for item in &items {
            for (column, buffer) in surviving.iter().zip(buffers.iter_mut()) {
                buffer.fill(column, item);
            }
        }

        for (column, buffer) in surviving.iter().zip(buffers) {
            handler(Series::new(column.metadata.clone(), buffer.into_values()));
        }
    }

    /// Collect the handler stream into an owned column list.
    pub fn create_series(&self, container: &C, filter: &AttributeFilter) -> Vec<Series> {
        let mut out = Vec::new();
        self.create_dataframe(container, &mut |series| out.push(series), filter);
        out
    }

    /// Apply the table's value columns onto the items its index columns
    /// resolve to.
    ///
    /// Fails on the first unresolved row; rows applied earlier in the same
    /// call stay mutated. A value column without a registered setter fails
    /// the whole call before any row is touched.
    pub fn update_series(&self, container: &mut C, dataframe: &UpdatingDataframe) -> GexResult<()> {
        let index_columns = dataframe.index_columns();
        if index_columns.is_empty() || index_columns.len() > 2 {
            return Err(GexError::Validation(format!(
                "Expected one or two index columns, got {}",
                index_columns.len()
            )));
        }

        // Settability is row-independent, so check it up front.
        let mut appliers: Vec<(&Series, &Column<T>)> = Vec::new();
        for series in dataframe.value_columns() {
            let column = self
                .columns
                .iter()
                .find(|c| c.metadata.name() == series.name())
                .ok_or_else(|| GexError::MissingSetter(series.name().to_string()))?;
            if !column.extractor.has_setter() {
                return Err(GexError::MissingSetter(series.name().to_string()));
            }
            appliers.push((series, column));
        }

        for row in 0..dataframe.row_count() {
            let item = self.resolve_item(container, dataframe, &index_columns, row)?;
            for (series, column) in &appliers {
                column
                    .extractor
                    .apply(column.metadata.name(), item, series, row)?;
            }
        }
        Ok(())
    }

    fn resolve_item<'a>(
        &self,
        container: &'a mut C,
        dataframe: &UpdatingDataframe,
        index_columns: &[&Series],
        row: usize,
    ) -> GexResult<&'a mut T> {
        if index_columns.len() == 2 {
            let getter = self.multi_index_getter.as_ref().ok_or_else(|| {
                GexError::Validation(
                    "No multi-index item getter registered for compound-key update".to_string(),
                )
            })?;
            getter(container, dataframe, row)
                .ok_or_else(|| GexError::UnresolvedRow(compound_key(index_columns, row)))
        } else {
            let id = index_columns[0].string_value(row).ok_or_else(|| {
                GexError::Validation("Single index column must be a string column".to_string())
            })?;
            let getter = self.item_getter.as_ref().ok_or_else(|| {
                GexError::Validation("No item getter registered for update".to_string())
            })?;
            getter(container, id).ok_or_else(|| GexError::UnresolvedRow(id.to_string()))
        }
    }
}

fn compound_key(index_columns: &[&Series], row: usize) -> String {
    index_columns
        .iter()
        .map(|c| cell_display(c, row))
        .collect::<Vec<_>>()
        .join("|")
}

fn cell_display(series: &Series, row: usize) -> String {
    series
        .string_value(row)
        .map(str::to_string)
        .or_else(|| series.int_value(row).map(|v| v.to_string()))
        .or_else(|| series.double_value(row).map(|v| v.to_string()))
        .or_else(|| series.boolean_value(row).map(|v| v.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesDataType;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl Color {
        fn ordinal(self) -> i32 {
            match self {
                Color::Red => 0,
                Color::Green => 1,
                Color::Blue => 2,
            }
        }

        fn from_ordinal(ordinal: i32) -> Color {
            match ordinal {
                0 => Color::Red,
                1 => Color::Green,
                _ => Color::Blue,
            }
        }
    }

    struct Element {
        id: String,
        id2: i32,
        str_value: String,
        double_value: f64,
        int_value: i32,
        color: Color,
        measured_flow: Option<f64>,
    }

    impl Element {
        fn new(id: &str, str_value: &str, double_value: f64, int_value: i32, color: Color) -> Self {
            Self {
                id: id.to_string(),
                id2: 0,
                str_value: str_value.to_string(),
                double_value,
                int_value,
                color,
                measured_flow: None,
            }
        }

        fn with_id2(mut self, id2: i32) -> Self {
            self.id2 = id2;
            self
        }
    }

    struct Container {
        elements: Vec<Element>,
    }

    impl Container {
        fn elements(&self) -> Vec<&Element> {
            self.elements.iter().collect()
        }

        fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
            self.elements.iter_mut().find(|e| e.id == id)
        }

        fn element(&self, id: &str) -> &Element {
            self.elements.iter().find(|e| e.id == id).unwrap()
        }
    }

    struct MultiIndexContainer {
        elements: Vec<Element>,
    }

    impl MultiIndexContainer {
        fn elements(&self) -> Vec<&Element> {
            self.elements.iter().collect()
        }

        fn element_mut(
            &mut self,
            dataframe: &UpdatingDataframe,
            row: usize,
        ) -> Option<&mut Element> {
            let id = dataframe.string_value("id", row)?;
            let id2 = dataframe.int_value("id2", row)?;
            self.elements
                .iter_mut()
                .find(|e| e.id == id && e.id2 == id2)
        }

        fn element(&self, id: &str, id2: i32) -> &Element {
            self.elements
                .iter()
                .find(|e| e.id == id && e.id2 == id2)
                .unwrap()
        }
    }

    fn container() -> Container {
        Container {
            elements: vec![
                Element::new("el1", "val1", 1.0, 10, Color::Red),
                Element::new("el2", "val2", 2.0, 20, Color::Green),
            ],
        }
    }

    fn updatable_mapper() -> DataframeMapper<Container, Element> {
        DataframeMapperBuilder::new(Container::elements)
            .item_getter(Container::element_mut)
            .strings_index("id", |e: &Element| e.id.clone())
            .strings_with(
                "str",
                |e: &Element| e.str_value.clone(),
                Some(Box::new(|e: &mut Element, v: &str| e.str_value = v.to_string())),
                true,
            )
            .ints_with(
                "int",
                |e: &Element| e.int_value,
                Some(Box::new(|e: &mut Element, v: i32| e.int_value = v)),
                true,
            )
            .doubles_with(
                "double",
                |e: &Element| e.double_value,
                Some(Box::new(|e: &mut Element, v: f64| e.double_value = v)),
                true,
            )
            .enums_with(
                "color",
                |e: &Element| e.color.ordinal(),
                Some(Box::new(|e: &mut Element, v: i32| e.color = Color::from_ordinal(v))),
                true,
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_columns_emitted_in_registration_order() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .strings("str", |e: &Element| e.str_value.clone())
            .ints("int", |e: &Element| e.int_value)
            .doubles("double", |e: &Element| e.double_value)
            .enums("color", |e: &Element| e.color.ordinal())
            .build()
            .unwrap();

        let series = mapper.create_series(&container(), &AttributeFilter::default());
        let names: Vec<&str> = series.iter().map(Series::name).collect();
        assert_eq!(names, vec!["id", "str", "int", "double", "color"]);
        assert!(series.iter().all(|s| s.len() == 2));
        assert_eq!(series[2].int_value(1), Some(20));
        assert_eq!(series[4].metadata().data_type(), SeriesDataType::Enum);
        assert_eq!(series[4].int_value(0), Some(Color::Red.ordinal()));
    }

    #[test]
    fn test_default_filter_drops_non_default_columns() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .strings_with("str", |e: &Element| e.str_value.clone(), None, false)
            .ints("int", |e: &Element| e.int_value)
            .doubles_with("double", |e: &Element| e.double_value, None, false)
            .enums("color", |e: &Element| e.color.ordinal())
            .build()
            .unwrap();

        let series = mapper.create_series(&container(), &AttributeFilter::Defaults);
        let names: Vec<&str> = series.iter().map(Series::name).collect();
        assert_eq!(names, vec!["id", "int", "color"]);

        let all = mapper.create_series(&container(), &AttributeFilter::All);
        assert_eq!(all.len(), 5);
        // default set is a subset of the full set
        for name in &names {
            assert!(all.iter().any(|s| &s.name() == name));
        }
    }

    #[test]
    fn test_selection_filter_keeps_index() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .strings("str", |e: &Element| e.str_value.clone())
            .ints("int", |e: &Element| e.int_value)
            .enums("color", |e: &Element| e.color.ordinal())
            .build()
            .unwrap();

        let filter = AttributeFilter::Selection(vec!["str".to_string()]);
        let series = mapper.create_series(&container(), &filter);
        let names: Vec<&str> = series.iter().map(Series::name).collect();
        assert_eq!(names, vec!["id", "str"]);
    }

    #[test]
    fn test_missing_value_emitted_as_nan() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .doubles("flow", |e: &Element| e.measured_flow.unwrap_or(f64::NAN))
            .build()
            .unwrap();

        let mut source = container();
        source.elements[1].measured_flow = Some(42.5);
        let series = mapper.create_series(&source, &AttributeFilter::All);
        assert!(series[1].double_value(0).unwrap().is_nan());
        assert_eq!(series[1].double_value(1), Some(42.5));
    }

    #[test]
    fn test_duplicate_column_rejected_at_build() {
        let result = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .ints("id", |e: &Element| e.int_value)
            .build();
        assert!(matches!(result, Err(GexError::Validation(_))));
    }

    #[test]
    fn test_update_mono_index() {
        let mapper = updatable_mapper();
        let mut target = container();

        let mut df = UpdatingDataframe::new(2);
        df.add_series(Series::strings("id", true, vec!["el1".into(), "el2".into()]))
            .unwrap();
        df.add_series(Series::doubles("double", vec![1.2, 2.2])).unwrap();

        mapper.update_series(&mut target, &df).unwrap();
        assert_eq!(target.element("el1").double_value, 1.2);
        assert_eq!(target.element("el2").double_value, 2.2);
        // untouched columns stay put
        assert_eq!(target.element("el1").str_value, "val1");
    }

    #[test]
    fn test_update_multi_index() {
        let mapper = DataframeMapperBuilder::new(MultiIndexContainer::elements)
            .item_multi_index_getter(MultiIndexContainer::element_mut)
            .strings_index("id", |e: &Element| e.id.clone())
            .ints_index("id2", |e: &Element| e.id2)
            .strings_with(
                "str",
                |e: &Element| e.str_value.clone(),
                Some(Box::new(|e: &mut Element, v: &str| e.str_value = v.to_string())),
                true,
            )
            .doubles_with(
                "double",
                |e: &Element| e.double_value,
                Some(Box::new(|e: &mut Element, v: f64| e.double_value = v)),
                true,
            )
            .build()
            .unwrap();

        let mut target = MultiIndexContainer {
            elements: vec![
                Element::new("el1", "val1", 1.0, 10, Color::Red),
                Element::new("el1", "val2", 2.0, 20, Color::Green).with_id2(1),
                Element::new("el2", "val2", 2.0, 20, Color::Green),
            ],
        };

        let mut df = UpdatingDataframe::new(2);
        df.add_series(Series::strings("id", true, vec!["el1".into(), "el2".into()]))
            .unwrap();
        df.add_series(Series::ints("id2", true, vec![1, 0])).unwrap();
        df.add_series(Series::doubles("double", vec![1.2, 2.2])).unwrap();
        df.add_series(Series::strings("str", false, vec!["val3".into(), "val4".into()]))
            .unwrap();

        mapper.update_series(&mut target, &df).unwrap();
        assert_eq!(target.element("el1", 0).double_value, 1.0);
        assert_eq!(target.element("el1", 1).double_value, 1.2);
        assert_eq!(target.element("el2", 0).double_value, 2.2);
        assert_eq!(target.element("el1", 0).str_value, "val1");
        assert_eq!(target.element("el1", 1).str_value, "val3");
        assert_eq!(target.element("el2", 0).str_value, "val4");
    }

    #[test]
    fn test_update_unresolved_row_leaves_items_unmutated() {
        let mapper = updatable_mapper();
        let mut target = container();

        let mut df = UpdatingDataframe::new(1);
        df.add_series(Series::strings("id", true, vec!["UNKNOWN".into()]))
            .unwrap();
        df.add_series(Series::doubles("double", vec![9.9])).unwrap();

        let err = mapper.update_series(&mut target, &df).unwrap_err();
        assert!(matches!(err, GexError::UnresolvedRow(ref id) if id == "UNKNOWN"));
        assert_eq!(target.element("el1").double_value, 1.0);
        assert_eq!(target.element("el2").double_value, 2.0);
    }

    #[test]
    fn test_update_earlier_rows_stay_applied() {
        let mapper = updatable_mapper();
        let mut target = container();

        let mut df = UpdatingDataframe::new(2);
        df.add_series(Series::strings("id", true, vec!["el1".into(), "UNKNOWN".into()]))
            .unwrap();
        df.add_series(Series::doubles("double", vec![5.5, 9.9])).unwrap();

        assert!(mapper.update_series(&mut target, &df).is_err());
        // row 0 was applied before row 1 failed; no rollback
        assert_eq!(target.element("el1").double_value, 5.5);
        assert_eq!(target.element("el2").double_value, 2.0);
    }

    #[test]
    fn test_update_missing_setter_fails_before_any_row() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .item_getter(Container::element_mut)
            .strings_index("id", |e: &Element| e.id.clone())
            .doubles_with(
                "double",
                |e: &Element| e.double_value,
                Some(Box::new(|e: &mut Element, v: f64| e.double_value = v)),
                true,
            )
            .ints("int", |e: &Element| e.int_value)
            .build()
            .unwrap();
        let mut target = container();

        let mut df = UpdatingDataframe::new(1);
        df.add_series(Series::strings("id", true, vec!["el1".into()])).unwrap();
        df.add_series(Series::doubles("double", vec![7.7])).unwrap();
        df.add_series(Series::ints("int", false, vec![99])).unwrap();

        let err = mapper.update_series(&mut target, &df).unwrap_err();
        assert!(matches!(err, GexError::MissingSetter(ref name) if name == "int"));
        assert_eq!(target.element("el1").double_value, 1.0);
    }

    #[test]
    fn test_read_update_read_roundtrip() {
        let mapper = updatable_mapper();
        let source = container();
        let exported = mapper.create_series(&source, &AttributeFilter::All);

        // feed the exported table back into a fresh container with the same ids
        let mut target = Container {
            elements: vec![
                Element::new("el1", "", 0.0, 0, Color::Blue),
                Element::new("el2", "", 0.0, 0, Color::Blue),
            ],
        };
        let df = UpdatingDataframe::try_from(exported.clone()).unwrap();
        mapper.update_series(&mut target, &df).unwrap();

        let reexported = mapper.create_series(&target, &AttributeFilter::All);
        assert_eq!(reexported, exported);
    }

    #[test]
    fn test_capability_bundle_emitted_when_present() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .doubles("double", |e: &Element| e.double_value)
            .capability(
                "measurement",
                |e: &Element| e.measured_flow.is_some(),
                |group| group.doubles("measured_flow", |e| e.measured_flow.unwrap_or(f64::NAN)),
            )
            .build()
            .unwrap();

        let mut source = container();
        source.elements[0].measured_flow = Some(12.0);
        let series = mapper.create_series(&source, &AttributeFilter::All);
        let names: Vec<&str> = series.iter().map(Series::name).collect();
        // bundle columns come after all static columns
        assert_eq!(names, vec!["id", "double", "measured_flow"]);
        assert_eq!(series[2].double_value(0), Some(12.0));
        assert!(series[2].double_value(1).unwrap().is_nan());
    }

    #[test]
    fn test_capability_bundle_absent_when_no_item_has_it() {
        let mapper = DataframeMapperBuilder::new(Container::elements)
            .strings_index("id", |e: &Element| e.id.clone())
            .capability(
                "measurement",
                |e: &Element| e.measured_flow.is_some(),
                |group| group.doubles("measured_flow", |e| e.measured_flow.unwrap_or(f64::NAN)),
            )
            .build()
            .unwrap();

        let series = mapper.create_series(&container(), &AttributeFilter::All);
        let names: Vec<&str> = series.iter().map(Series::name).collect();
        assert_eq!(names, vec!["id"]);
    }
}
