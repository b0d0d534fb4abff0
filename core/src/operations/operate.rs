use super::{cross_section::cross_section, roles, OperationKind, OperationNode, OperationOutput};
use crate::design::Design;
use crate::error::{LaminateResult, ReferenceError};
use crate::geometry::{unary_safe_union, PlanarRegion};
use crate::id::EntityId;
use crate::laminate::{BinaryOperation, Laminate, LaminateFunction, UnaryOperation};
use crate::manufacturing::{
    find_bodies, modify_device, removability, support_candidate, tool_clearance,
    CustomSupportParams,
};
use crate::sketch::RegionConverter;

/// Width of the band reported as a support candidate's cut area.
const CUT_AREA_WIDTH: f64 = 1e-5;

impl OperationNode {
    /// Compute this node's outputs from the current state of `design`.
    ///
    /// Reads parents' cached outputs and the design's sketches; never
    /// mutates the design. Parents must already be computed.
    pub fn operate(&self, design: &Design) -> LaminateResult<Vec<OperationOutput>> {
        let def = design.layer_def();
        let config = design.config();

        match &self.kind {
            OperationKind::SketchOperation { layers } => {
                let region = self.sketch_region(design)?;
                let mut laminate = Laminate::new(def);
                for layer in layers {
                    laminate.replace_layer_geometry(*layer, region.clone())?;
                }
                Ok(self.single_output(laminate))
            }
            OperationKind::LocateOperation => {
                let region = self.sketch_region(design)?;
                let mut laminate = Laminate::new(def);
                for layer in def.ids() {
                    laminate.replace_layer_geometry(layer, region.clone())?;
                }
                Ok(self.single_output(laminate))
            }
            OperationKind::LaminateOperation { function } => {
                let unary = self.resolve_all(design, roles::UNARY)?;
                let laminate = match function {
                    LaminateFunction::Union => {
                        Laminate::unary_operation(def, &unary, UnaryOperation::Union)?
                    }
                    LaminateFunction::Intersection => {
                        Laminate::unary_operation(def, &unary, UnaryOperation::Intersection)?
                    }
                    LaminateFunction::Difference | LaminateFunction::SymmetricDifference => {
                        let binary = self.resolve_all(design, roles::BINARY)?;
                        let left = Laminate::unary_operation(def, &unary, UnaryOperation::Union)?;
                        let right = Laminate::unary_operation(def, &binary, UnaryOperation::Union)?;
                        let op = if *function == LaminateFunction::Difference {
                            BinaryOperation::Difference
                        } else {
                            BinaryOperation::SymmetricDifference
                        };
                        left.binary_operation(&right, op)
                    }
                };
                Ok(self.single_output(laminate))
            }
            OperationKind::CrossSection { scale } => {
                let source = self.resolve_one(design, roles::SOURCE)?;
                let sketch = design.sketch(self.sketch_link(roles::CROSS_SECTION)?)?;
                let laminate = cross_section(source, def, sketch, *scale, config)?;
                Ok(self.single_output(laminate))
            }
            OperationKind::CustomSupport {
                layers,
                support_width,
                support_out,
                hole_radius,
                cut_width,
            } => {
                let device = self.resolve_one(design, roles::DEVICE)?;
                let sketch = design.sketch(self.sketch_link(roles::SKETCH)?)?;
                let area = RegionConverter::new(config).convert(sketch)?;
                let params = CustomSupportParams {
                    support_width: config.scaled(*support_width),
                    support_out: config.scaled(*support_out),
                    hole_radius: config.scaled(*hole_radius),
                    cut_width: config.scaled(*cut_width),
                    circle_segments: config.circle_segments,
                };
                let result = modify_device(device, def, &sketch.paths(), &area, layers, &params)?;
                Ok(vec![
                    self.labeled_output(result.device, "device"),
                    self.labeled_output(result.supports, "supports"),
                    self.labeled_output(result.cuts, "cuts"),
                ])
            }
            OperationKind::SupportCandidate {
                keepout,
                support_gap,
                keepout_distance,
            } => {
                let parent = self.resolve_one(design, roles::PARENT)?;
                let result = support_candidate(
                    parent,
                    def,
                    *keepout,
                    config.scaled(*support_gap),
                    config.scaled(*keepout_distance),
                    config.scaled(CUT_AREA_WIDTH),
                )?;
                // Index 0 is the default output. Saved links fix indices 2 and 3.
                Ok(vec![
                    self.labeled_output(result.support.clone(), "support"),
                    self.labeled_output(result.support, "support"),
                    self.labeled_output(result.cut_line, "cut line"),
                    self.labeled_output(result.cut_area, "cut area"),
                ])
            }
            OperationKind::Removability { mode } => {
                let parent = self.resolve_one(design, roles::PARENT)?;
                Ok(self.single_output(removability(parent, def, *mode)?))
            }
            OperationKind::ToolClearance { keepout } => {
                let parent = self.resolve_one(design, roles::PARENT)?;
                Ok(self.single_output(tool_clearance(parent, def, *keepout)?))
            }
            OperationKind::IdentifyBodies => {
                let parent = self.resolve_one(design, roles::PARENT)?;
                Ok(find_bodies(parent, def)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, body)| self.labeled_output(body, &format!("body {}", i)))
                    .collect())
            }
        }
    }

    /// Every laminate linked under `role`; an absent role is an empty list.
    fn resolve_all(&self, design: &Design, role: &str) -> LaminateResult<Vec<Laminate>> {
        let Some(refs) = self.operation_links.get(role) else {
            return Ok(Vec::new());
        };
        refs.iter()
            .map(|r| design.resolve_reference(self.id, *r).cloned())
            .collect()
    }

    fn resolve_one<'a>(&self, design: &'a Design, role: &str) -> LaminateResult<&'a Laminate> {
        let reference = self
            .operation_links
            .get(role)
            .and_then(|refs| refs.first())
            .ok_or_else(|| self.missing_link(role))?;
        design.resolve_reference(self.id, *reference)
    }

    fn sketch_link(&self, role: &str) -> LaminateResult<EntityId> {
        self.sketch_links
            .get(role)
            .and_then(|ids| ids.first())
            .copied()
            .ok_or_else(|| self.missing_link(role).into())
    }

    /// Union of every sketch linked as `sketch`.
    fn sketch_region(&self, design: &Design) -> LaminateResult<PlanarRegion> {
        let ids = self
            .sketch_links
            .get(roles::SKETCH)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| self.missing_link(roles::SKETCH))?;
        let converter = RegionConverter::new(design.config());
        let regions = ids
            .iter()
            .map(|id| converter.convert(design.sketch(*id)?))
            .collect::<LaminateResult<Vec<_>>>()?;
        Ok(unary_safe_union(regions.iter()))
    }

    fn missing_link(&self, role: &str) -> ReferenceError {
        ReferenceError::MissingLink {
            operation: self.id,
            role: role.to_string(),
        }
    }
}
