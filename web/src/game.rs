use crate::scheduler::GlooScheduler;
use crate::utils::*;
use bitflags::bitflags;
use retrosweeper_core as game;
use web_sys::PointerEvent;
use yew::prelude::*;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq)]
    pub(crate) struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

impl MouseButtons {
    /// Which game button a held combination stands for, chords and other buttons mean nothing.
    fn as_button(self) -> Option<game::Button> {
        match self {
            Self::LEFT => Some(game::Button::Primary),
            Self::RIGHT => Some(game::Button::Secondary),
            _ => None,
        }
    }
}

fn device_of(e: &PointerEvent) -> game::Device {
    match e.pointer_type().as_str() {
        "touch" | "pen" => game::Device::Touch,
        _ => game::Device::Mouse,
    }
}

fn point_of(e: &PointerEvent) -> game::Point {
    game::Point::new(e.client_x() as f32, e.client_y() as f32)
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct PointerState {
    pos: game::Coord2,
    buttons: MouseButtons,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum PointerMsg {
    Down {
        pos: game::Coord2,
        device: game::Device,
        buttons: MouseButtons,
        point: game::Point,
    },
    Enter {
        pos: game::Coord2,
        buttons: MouseButtons,
    },
    Move {
        point: game::Point,
    },
    Up {
        pos: game::Coord2,
    },
    Leave,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Pointer(PointerMsg),
    TimerFired(game::Timer),
    NewGame,
}

#[derive(Properties, Clone, PartialEq)]
struct CellProps {
    pos: game::Coord2,
    cell_view: game::CellView,
    #[prop_or_default]
    pressed: bool,
    callback: Callback<PointerMsg>,
}

#[function_component(CellView)]
fn cell_component(props: &CellProps) -> Html {
    use game::CellView::*;

    let CellProps {
        pos,
        cell_view,
        pressed,
        callback,
    } = props.clone();

    let mut class = classes!(
        "cell",
        match cell_view {
            Hidden => classes!(),
            Revealed(count) => classes!("open", format!("num-{}", count)),
            Flagged => classes!("flag"),
            Detonated => classes!("open", "mine", "oops"),
            WrongFlag => classes!("flag", "wrong"),
        }
    );
    if pressed {
        class.push("open");
    }

    let onpointerdown = {
        let callback = callback.clone();
        Callback::from(move |e: PointerEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            let device = device_of(&e);
            log::trace!("{:?} pointer down ({:?}) on {:?}", device, buttons, pos);
            callback.emit(PointerMsg::Down {
                pos,
                device,
                buttons,
                point: point_of(&e),
            });
        })
    };

    let onpointerenter = {
        let callback = callback.clone();
        Callback::from(move |e: PointerEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            if !buttons.is_empty() {
                callback.emit(PointerMsg::Enter { pos, buttons });
            }
        })
    };

    let onpointerup = Callback::from(move |_: PointerEvent| {
        log::trace!("pointer up on {:?}", pos);
        callback.emit(PointerMsg::Up { pos });
    });

    html! {
        <td {class} {onpointerdown} {onpointerenter} {onpointerup}/>
    }
}

#[derive(Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    pub config: game::SessionConfig,
    pub seed: Option<u64>,
}

pub(crate) struct GameView {
    session: game::Session<GlooScheduler>,
    current_pointer: Option<PointerState>,
}

impl GameView {
    fn create_session(ctx: &Context<Self>) -> game::Session<GlooScheduler> {
        let GameProps { config, seed } = ctx.props().clone();
        let seed = seed.unwrap_or_else(js_random_seed);
        let scheduler = GlooScheduler::new(ctx.link().clone());
        game::Session::new(config, seed, scheduler).expect("config is validated at startup")
    }

    fn get_face_class(&self) -> Classes {
        use game::Face::*;

        classes!(match self.session.face() {
            Neutral if self.session.state() == game::SessionState::Idle => "not-started",
            Neutral => "in-progress",
            Alert => "mid-open",
            Dead => "lose",
            Cool => "win",
        })
    }

    fn is_pressed(&self, pos: game::Coord2, cell_view: game::CellView) -> bool {
        if self.session.is_finished() || cell_view != game::CellView::Hidden {
            return false;
        }

        matches!(
            self.current_pointer,
            Some(PointerState {
                pos: pressed,
                buttons: MouseButtons::LEFT,
            }) if pressed == pos
        )
    }

    fn on_pointer(&mut self, msg: PointerMsg) -> bool {
        use PointerMsg::*;

        match msg {
            Down {
                pos,
                device,
                buttons,
                point,
            } => {
                if buttons.as_button().is_none() {
                    return false;
                }
                self.current_pointer = Some(PointerState { pos, buttons });
                self.session.press(pos, device, point);
                true
            }
            Enter { pos, buttons } => match self.current_pointer.as_mut() {
                Some(state) if state.pos != pos => {
                    state.pos = pos;
                    state.buttons = buttons;
                    true
                }
                _ => false,
            },
            Move { point } => {
                let face = self.session.face();
                self.session.pointer_moved(point);
                face != self.session.face()
            }
            Up { pos } => {
                let Some(PointerState { buttons, .. }) = self.current_pointer.take() else {
                    return false;
                };
                let Some(button) = buttons.as_button() else {
                    self.session.pointer_left();
                    return true;
                };
                log::debug!("{:?} release on {:?}", button, pos);
                let effect = self.session.release(pos, button);
                log::trace!("release effect: {:?}", effect);
                true
            }
            Leave => {
                log::trace!("pointer left the board");
                self.session.pointer_left();
                self.current_pointer.take().is_some()
            }
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            session: Self::create_session(ctx),
            current_pointer: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Pointer(msg) => self.on_pointer(msg),
            TimerFired(timer) => self.session.on_timer(timer).is_some(),
            NewGame => {
                self.current_pointer = None;
                if let Err(err) = self.session.reset() {
                    log::error!("Could not start a new game: {}", err);
                }
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let (rows, cols) = self.session.board().size();
        let face_class = self.get_face_class();
        let is_playable = !self.session.is_finished();
        let mines_left = format_for_counter(self.session.mines_left());
        let elapsed_time = format_for_counter(self.session.elapsed_secs());

        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            Msg::NewGame
        });
        let onpointermove = ctx
            .link()
            .callback(|e: PointerEvent| Msg::Pointer(PointerMsg::Move { point: point_of(&e) }));
        let onpointerleave = ctx.link().callback(|_: PointerEvent| Msg::Pointer(PointerMsg::Leave));

        html! {
            <div class="retrosweeper" oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}>
                <nav>
                    <aside>{mines_left}</aside>
                    <span><button class={face_class} onclick={cb_new_game}/></span>
                    <aside>{elapsed_time}</aside>
                </nav>
                <table class={is_playable.then_some("playable")} {onpointermove} {onpointerleave}>
                    {
                        for (0..rows).map(|row| html! {
                            <tr>
                                {
                                    for (0..cols).map(|col| {
                                        let pos = (row, col);
                                        let cell_view = self.session.board().view_at(pos);
                                        let pressed = self.is_pressed(pos, cell_view);
                                        let callback = ctx.link().callback(Msg::Pointer);
                                        html! {
                                            <CellView {pos} {cell_view} {pressed} {callback}/>
                                        }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
            </div>
        }
    }
}
