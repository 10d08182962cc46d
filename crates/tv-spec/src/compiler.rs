//! Selection → chart specification
//!
//! Every lens shares one filter-composition contract: optional group filter,
//! optional region filter, then a sum aggregation grouped by what the lens
//! draws. Filters always precede the aggregation. The choropleth keeps every
//! shape, so its filters act on the joined dataset instead of the shapes.

use tv_core::{LensKind, RegionCode, RegionResolver, Selection};
use tv_data::config::DashboardConfig;
use tv_data::sources::tabular_source::{COUNT_COLUMN, GROUP_COLUMN, STATE_COLUMN, STATUS_COLUMN};

use crate::encoding::{
    count_tooltip, nominal_axis, status_color, status_domain, tooltip, total_axis,
    CHART_HEIGHT, CHOROPLETH_HEIGHT, CHOROPLETH_STROKE, CHOROPLETH_WIDTH, HIGHLIGHT_STROKE_WIDTH,
    TOTAL_FIELD,
};
use crate::spec::{
    Aggregate, AggregateOp, ChartSpec, ColorChannel, ColorScale, DataSourceRef, FieldType,
    Highlight, LookupJoin, Mark, MarkKind, Predicate, StackMode, TransformStep, VisualEncoding,
    Width,
};

/// Compiles selections into per-lens specifications for one dashboard config
#[derive(Debug, Clone)]
pub struct SpecCompiler {
    config: DashboardConfig,
    resolver: RegionResolver,
}

impl SpecCompiler {
    pub fn new(config: DashboardConfig) -> Self {
        let resolver = RegionResolver::new(config.tabular_key_style);
        Self { config, resolver }
    }

    /// Compile the spec for `lens`. Identical inputs give identical specs.
    pub fn compile(&self, selection: &Selection, lens: LensKind) -> ChartSpec {
        let spec = match lens {
            LensKind::Choropleth => self.compile_choropleth(selection),
            LensKind::StatusBar => self.compile_status_bar(selection),
            LensKind::StackedBar => self.compile_stacked_bar(selection),
            LensKind::GroupedBar => self.compile_grouped_bar(selection),
            LensKind::Treemap => self.compile_treemap(selection),
        };
        tracing::debug!(lens = %lens, steps = spec.transform.len(), "Compiled chart spec");
        spec
    }

    /// Predicates implied by the selection on the tabular dataset, group first
    pub fn compose_filters(&self, selection: &Selection) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(2);
        if let Some(group) = selection.active_group.group() {
            predicates.push(Predicate::field_equals(GROUP_COLUMN, group.as_str()));
        }
        if let Some(region) = selection.active_region {
            predicates.push(Predicate::field_equals(STATE_COLUMN, self.resolver.tabular_key(region)));
        }
        predicates
    }

    /// Filters followed by the sum over `group_by`
    fn tabular_pipeline(&self, selection: &Selection, group_by: &[&str]) -> Vec<TransformStep> {
        let mut steps: Vec<TransformStep> = self
            .compose_filters(selection)
            .into_iter()
            .map(|predicate| TransformStep::Filter { predicate })
            .collect();
        steps.push(sum_counts(group_by.iter().map(|f| f.to_string()).collect()));
        steps
    }

    fn tabular_source(&self) -> DataSourceRef {
        DataSourceRef::Tabular { url: self.config.tabular_url.clone() }
    }

    fn region_suffix(&self, selection: &Selection) -> Option<&'static str> {
        selection.active_region.map(|region| self.resolver.display_name(region))
    }

    pub fn compile_status_bar(&self, selection: &Selection) -> ChartSpec {
        let title = match self.region_suffix(selection) {
            Some(name) => format!("Threat Categories in {}", name),
            None => "Threat Categories Across All States".to_string(),
        };

        let mut x = nominal_axis(STATUS_COLUMN, "Conservation Status");
        x.sort = status_domain();

        ChartSpec {
            lens: LensKind::StatusBar,
            data: self.tabular_source(),
            transform: self.tabular_pipeline(selection, &[STATUS_COLUMN]),
            encoding: VisualEncoding {
                title,
                width: Width::Container,
                height: CHART_HEIGHT,
                mark: Mark {
                    kind: MarkKind::Bar,
                    tooltip: true,
                    corner_radius_end: Some(4),
                    stroke: None,
                    stroke_width: None,
                },
                projection: None,
                x: Some(x),
                y: Some(total_axis()),
                x_offset: None,
                color: status_color(None, false),
                tooltip: vec![
                    tooltip(STATUS_COLUMN, FieldType::Nominal, "Status"),
                    count_tooltip(),
                ],
                highlight: None,
                grid: true,
            },
        }
    }

    pub fn compile_stacked_bar(&self, selection: &Selection) -> ChartSpec {
        let mut y = total_axis();
        y.stack = Some(StackMode::Normalize);
        y.format = Some("%".to_string());

        ChartSpec {
            lens: LensKind::StackedBar,
            data: self.tabular_source(),
            transform: self.tabular_pipeline(selection, &[STATE_COLUMN, STATUS_COLUMN]),
            encoding: VisualEncoding {
                title: "Threat Level Composition by State".to_string(),
                width: Width::Container,
                height: CHART_HEIGHT,
                mark: bar_mark(),
                projection: None,
                x: Some(nominal_axis(STATE_COLUMN, "State")),
                y: Some(y),
                x_offset: None,
                color: status_color(Some("Conservation Status"), true),
                tooltip: vec![
                    tooltip(STATE_COLUMN, FieldType::Nominal, "State"),
                    tooltip(STATUS_COLUMN, FieldType::Nominal, "Status"),
                    count_tooltip(),
                ],
                highlight: None,
                grid: true,
            },
        }
    }

    pub fn compile_grouped_bar(&self, selection: &Selection) -> ChartSpec {
        let title = match self.region_suffix(selection) {
            Some(name) => format!("Animal Groups in {}", name),
            None => "Animal Groups Across Australia".to_string(),
        };

        ChartSpec {
            lens: LensKind::GroupedBar,
            data: self.tabular_source(),
            transform: self.tabular_pipeline(selection, &[GROUP_COLUMN, STATUS_COLUMN]),
            encoding: VisualEncoding {
                title,
                width: Width::Container,
                height: CHART_HEIGHT,
                mark: bar_mark(),
                projection: None,
                x: Some(nominal_axis(GROUP_COLUMN, "Animal Group")),
                y: Some(total_axis()),
                x_offset: Some(STATUS_COLUMN.to_string()),
                color: status_color(Some("Conservation Status"), true),
                tooltip: vec![
                    tooltip(GROUP_COLUMN, FieldType::Nominal, "Animal Group"),
                    tooltip(STATUS_COLUMN, FieldType::Nominal, "Status"),
                    count_tooltip(),
                ],
                highlight: None,
                grid: true,
            },
        }
    }

    pub fn compile_treemap(&self, selection: &Selection) -> ChartSpec {
        let mut y = nominal_axis(STATUS_COLUMN, "Conservation Status");
        y.label_angle = None;
        y.sort = status_domain();

        ChartSpec {
            lens: LensKind::Treemap,
            data: self.tabular_source(),
            transform: self.tabular_pipeline(selection, &[GROUP_COLUMN, STATUS_COLUMN]),
            encoding: VisualEncoding {
                title: "Species Distribution: Group × Status".to_string(),
                width: Width::Container,
                height: CHART_HEIGHT,
                mark: Mark {
                    kind: MarkKind::Rect,
                    tooltip: true,
                    corner_radius_end: None,
                    stroke: Some("#fff".to_string()),
                    stroke_width: Some(2),
                },
                projection: None,
                x: Some(nominal_axis(GROUP_COLUMN, "Animal Group")),
                y: Some(y),
                x_offset: None,
                color: ColorChannel {
                    field: TOTAL_FIELD.to_string(),
                    field_type: FieldType::Quantitative,
                    title: Some("Species Count".to_string()),
                    scale: ColorScale::Sequential { scheme: "orangered".to_string(), domain: None },
                    legend: true,
                },
                tooltip: vec![
                    tooltip(GROUP_COLUMN, FieldType::Nominal, "Animal Group"),
                    tooltip(STATUS_COLUMN, FieldType::Nominal, "Status"),
                    count_tooltip(),
                ],
                highlight: None,
                grid: false,
            },
        }
    }

    /// Shapes are never filtered. The group predicate narrows the joined
    /// counts and the active region is drawn as a highlight.
    pub fn compile_choropleth(&self, selection: &Selection) -> ChartSpec {
        let boundary = &self.config.boundary;
        let name_field = boundary.name_field();

        let from_filter = selection
            .active_group
            .group()
            .map(|group| vec![Predicate::field_equals(GROUP_COLUMN, group.as_str())])
            .unwrap_or_default();

        let join = LookupJoin {
            key: name_field.clone(),
            from: self.tabular_source(),
            from_key: STATE_COLUMN.to_string(),
            from_filter,
            translate: self.boundary_translation(),
            fields: vec![COUNT_COLUMN.to_string()],
        };

        let highlight = selection.active_region.map(|region| Highlight {
            field: name_field.clone(),
            one_of: self.resolver.spellings(region).into_iter().map(str::to_string).collect(),
            stroke_width: HIGHLIGHT_STROKE_WIDTH,
        });

        ChartSpec {
            lens: LensKind::Choropleth,
            data: DataSourceRef::Boundaries {
                url: boundary.url.clone(),
                format: boundary.format,
                feature: boundary.feature.clone(),
            },
            transform: vec![
                TransformStep::LookupJoin(join),
                sum_counts(vec![name_field.clone()]),
            ],
            encoding: VisualEncoding {
                title: "Threatened Species Count by State".to_string(),
                width: Width::Fixed(CHOROPLETH_WIDTH),
                height: CHOROPLETH_HEIGHT,
                mark: Mark {
                    kind: MarkKind::Geoshape,
                    tooltip: true,
                    corner_radius_end: None,
                    stroke: Some(CHOROPLETH_STROKE.to_string()),
                    stroke_width: Some(1),
                },
                projection: Some("equirectangular".to_string()),
                x: None,
                y: None,
                x_offset: None,
                color: ColorChannel {
                    field: TOTAL_FIELD.to_string(),
                    field_type: FieldType::Quantitative,
                    title: Some("Threatened Species".to_string()),
                    scale: ColorScale::Sequential {
                        scheme: "oranges".to_string(),
                        domain: Some([0, self.config.choropleth_domain_max]),
                    },
                    legend: true,
                },
                tooltip: vec![
                    tooltip(&name_field, FieldType::Nominal, "State"),
                    {
                        let mut count = count_tooltip();
                        count.format = Some(",.0f".to_string());
                        count
                    },
                ],
                highlight,
                grid: false,
            },
        }
    }

    /// Any spelling a boundary revision may use, mapped onto the tabular
    /// spelling of the same region
    fn boundary_translation(&self) -> Vec<[String; 2]> {
        let mut translate = Vec::new();
        for region in RegionCode::ALL {
            let tabular = self.resolver.tabular_key(region);
            for spelling in self.resolver.spellings(region) {
                if spelling != tabular {
                    translate.push([spelling.to_string(), tabular.to_string()]);
                }
            }
        }
        translate
    }
}

/// Compile one lens with a throwaway compiler
pub fn compile(selection: &Selection, lens: LensKind, config: &DashboardConfig) -> ChartSpec {
    SpecCompiler::new(config.clone()).compile(selection, lens)
}

fn sum_counts(group_by: Vec<String>) -> TransformStep {
    TransformStep::Aggregate(Aggregate {
        op: AggregateOp::Sum,
        field: COUNT_COLUMN.to_string(),
        as_field: TOTAL_FIELD.to_string(),
        group_by,
    })
}

fn bar_mark() -> Mark {
    Mark {
        kind: MarkKind::Bar,
        tooltip: true,
        corner_radius_end: None,
        stroke: None,
        stroke_width: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_core::{GroupFilter, SpeciesGroup, TabularKeyStyle};

    fn compiler() -> SpecCompiler {
        SpecCompiler::new(DashboardConfig::default())
    }

    fn selection(group: GroupFilter, region: Option<RegionCode>) -> Selection {
        Selection { active_group: group, active_region: region }
    }

    #[test]
    fn test_unfiltered_pipeline_is_just_the_aggregate() {
        let spec = compiler().compile(&Selection::default(), LensKind::StatusBar);
        assert_eq!(spec.transform.len(), 1);
        assert_eq!(spec.aggregate().unwrap().group_by, vec!["status"]);
        assert_eq!(spec.encoding.title, "Threat Categories Across All States");
    }

    #[test]
    fn test_filters_precede_aggregate_for_every_tabular_lens() {
        let sel = selection(GroupFilter::Only(SpeciesGroup::Birds), Some(RegionCode::Qld));
        for lens in [LensKind::StatusBar, LensKind::StackedBar, LensKind::GroupedBar, LensKind::Treemap] {
            let spec = compiler().compile(&sel, lens);
            assert_eq!(spec.transform.len(), 3, "{lens}");
            assert!(spec.transform[0].is_filter());
            assert!(spec.transform[1].is_filter());
            assert!(matches!(spec.transform[2], TransformStep::Aggregate(_)));

            let filters = spec.filters();
            assert_eq!(*filters[0], Predicate::field_equals("group", "Birds"));
            assert_eq!(*filters[1], Predicate::field_equals("state", "Queensland"));
        }
    }

    #[test]
    fn test_group_by_per_lens() {
        let compiler = compiler();
        let sel = Selection::default();
        let group_by = |lens| compiler.compile(&sel, lens).aggregate().unwrap().group_by.clone();

        assert_eq!(group_by(LensKind::StatusBar), vec!["status"]);
        assert_eq!(group_by(LensKind::StackedBar), vec!["state", "status"]);
        assert_eq!(group_by(LensKind::GroupedBar), vec!["group", "status"]);
        assert_eq!(group_by(LensKind::Treemap), vec!["group", "status"]);
        assert_eq!(group_by(LensKind::Choropleth), vec!["properties.STE_NAME16"]);
    }

    #[test]
    fn test_region_filter_uses_tabular_spelling() {
        let mut config = DashboardConfig::default();
        config.tabular_key_style = TabularKeyStyle::Code;
        let spec = SpecCompiler::new(config).compile(
            &selection(GroupFilter::All, Some(RegionCode::Nsw)),
            LensKind::GroupedBar,
        );
        assert_eq!(spec.filters(), vec![&Predicate::field_equals("state", "NSW")]);
        assert_eq!(spec.encoding.title, "Animal Groups in New South Wales");
    }

    #[test]
    fn test_choropleth_never_filters_shapes() {
        let sel = selection(GroupFilter::Only(SpeciesGroup::Reptiles), Some(RegionCode::Wa));
        let spec = compiler().compile(&sel, LensKind::Choropleth);

        assert!(spec.filters().is_empty());
        match &spec.transform[0] {
            TransformStep::LookupJoin(join) => {
                assert_eq!(join.key, "properties.STE_NAME16");
                assert_eq!(join.from_key, "state");
                assert_eq!(join.from_filter, vec![Predicate::field_equals("group", "Reptiles")]);
                assert!(join.translate.contains(&["Vic.".to_string(), "Victoria".to_string()]));
                assert!(join.translate.iter().all(|[from, to]| from != to));
            }
            other => panic!("expected lookup join, got {:?}", other),
        }

        let highlight = spec.encoding.highlight.expect("active region is highlighted");
        assert_eq!(highlight.field, "properties.STE_NAME16");
        assert!(highlight.matches("Western Australia"));
        assert!(highlight.matches("WA"));
        assert!(!highlight.matches("Victoria"));
    }

    #[test]
    fn test_choropleth_follows_boundary_revision_and_domain() {
        let mut config = DashboardConfig::default();
        config.boundary.name_property = "STE_NAME21".to_string();
        config.choropleth_domain_max = 400;
        config.tabular_key_style = TabularKeyStyle::Code;

        let spec = SpecCompiler::new(config).compile(&Selection::default(), LensKind::Choropleth);
        let TransformStep::LookupJoin(join) = &spec.transform[0] else {
            panic!("expected lookup join");
        };
        assert_eq!(join.key, "properties.STE_NAME21");
        assert!(join.translate.contains(&["Queensland".to_string(), "QLD".to_string()]));
        assert_eq!(
            spec.encoding.color.scale,
            ColorScale::Sequential { scheme: "oranges".into(), domain: Some([0, 400]) }
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let sel = selection(GroupFilter::Only(SpeciesGroup::Fish), Some(RegionCode::Tas));
        for lens in LensKind::ALL {
            let first = compiler().compile(&sel, lens);
            let second = compile(&sel, lens, &DashboardConfig::default());
            assert_eq!(first, second);
            assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        }
    }

    #[test]
    fn test_selection_change_changes_spec() {
        let compiler = compiler();
        let before = compiler.compile(&Selection::default(), LensKind::Treemap);
        let after = compiler.compile(
            &selection(GroupFilter::Only(SpeciesGroup::Mammals), None),
            LensKind::Treemap,
        );
        assert_ne!(before, after);
    }
}
