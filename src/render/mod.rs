pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod placeholder;
pub(crate) mod surface;
pub(crate) mod svg;
pub(crate) mod text;
pub(crate) mod watermark;
