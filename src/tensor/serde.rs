use super::MultiView;
use crate::{error::DataError, Float};

// Wire form of a MultiView, checked by `MultiView::from_raw` before use.
#[derive(::serde::Deserialize)]
#[serde(rename = "MultiView", deny_unknown_fields)]
pub(super) struct RawMultiView {
    views: usize,
    entities: usize,
    feature_shape: Vec<usize>,
    w: Vec<Float>,
}

impl TryFrom<RawMultiView> for MultiView {
    type Error = DataError;

    fn try_from(raw: RawMultiView) -> Result<Self, DataError> {
        MultiView::from_raw(raw.views, raw.entities, raw.feature_shape, raw.w)
    }
}
