pub mod font_loader;
pub mod fontdue_caption_renderer;
