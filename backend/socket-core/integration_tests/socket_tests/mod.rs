mod helpers;
mod lifecycle;
mod routing;
